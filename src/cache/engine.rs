//! Cache Engine Module
//!
//! Concurrent front end to [`CacheStore`]. Each operation runs as its own
//! tokio task and the caller races that task against a [`CancelToken`].
//!
//! Cancellation only stops the caller from waiting. The spawned task is never
//! aborted: it still takes the lock and applies its effect. A `set` reported
//! as cancelled can therefore become visible later, and a cancelled `get` may
//! still have promoted its key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, CancelToken};
use crate::error::{CacheError, Result};

// == Cache ==
/// Thread-safe LRU cache with per-call cancellation.
///
/// Cloning is cheap and every clone shares the same storage.
#[derive(Debug)]
pub struct Cache<V> {
    /// Single lock guarding index and recency list together
    store: Arc<Mutex<CacheStore<V>>>,
    /// Spawned operations not yet finished
    in_flight: Arc<AtomicUsize>,
    capacity: usize,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            capacity: self.capacity,
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let store = CacheStore::new(capacity)?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            capacity,
        })
    }

    // == Get ==
    /// Looks up `key` and promotes it to most recently used.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    /// [`CacheError::Cancelled`] or [`CacheError::DeadlineExceeded`] if
    /// `token` fires before the lookup reports back.
    pub async fn get(&self, token: &CancelToken, key: impl Into<String>) -> Result<Option<V>> {
        let key = key.into();
        self.run(token, "get", move |store| store.get(&key).cloned()).await
    }

    // == Set ==
    /// Stores `value` under `key` as the most recently used entry, evicting
    /// the least recently used entry if a new key does not fit.
    ///
    /// # Errors
    /// [`CacheError::Cancelled`] or [`CacheError::DeadlineExceeded`] if
    /// `token` fires first. The write still happens.
    pub async fn set(&self, token: &CancelToken, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        self.run(token, "set", move |store| store.set(key, value)).await
    }

    // == Flush ==
    /// Removes every entry and returns how many were dropped.
    pub async fn flush(&self, token: &CancelToken) -> Result<usize> {
        self.run(token, "flush", |store| store.flush()).await
    }

    // == Inspection ==
    /// Returns a statistics snapshot. Waits for the lock.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.store.lock().await.stats();
        stats.in_flight = self.in_flight();
        stats
    }

    /// Returns the number of cached entries. Waits for the lock.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Returns true if the cache holds no entries. Waits for the lock.
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Returns keys from least to most recently used without promoting any.
    pub async fn keys(&self) -> Vec<String> {
        self.store.lock().await.keys()
    }

    /// Returns the fixed maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of spawned operations that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    // == Runner ==
    /// Spawns `work` against the locked store and waits for it or the token,
    /// whichever comes first.
    async fn run<T, F>(&self, token: &CancelToken, op: &'static str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CacheStore<V>) -> T + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let guard = InFlightGuard::enter(&self.in_flight);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut locked = store.lock().await;
            work(&mut *locked)
        });

        tokio::select! {
            biased;
            reason = token.cancelled() => {
                debug!(op, ?reason, "caller stopped waiting, operation continues in background");
                Err(reason.into())
            }
            joined = handle => match joined {
                Ok(value) => Ok(value),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => Err(CacheError::Internal(format!("{op} task failed: {err}"))),
            },
        }
    }
}

// == In-Flight Guard ==
/// Counts a spawned operation until it is dropped, even if it panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
