//! Cache Store Module
//!
//! Lock-protected cache state: key index, recency list and statistics.
//! Every method here runs as one unit while the engine holds the lock.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheStats, EntryId, EntryList};
use crate::error::{CacheError, Result};

/// Upper bound on slots reserved up front; larger caches grow on demand.
const PREALLOCATE_LIMIT: usize = 1024;

// == Cache Store ==
/// Fixed-capacity key/value storage with strict LRU eviction.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key to list entry
    index: HashMap<String, EntryId>,
    /// Recency order, head = least recently used
    list: EntryList<V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }

        Ok(Self {
            index: HashMap::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            list: EntryList::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            stats: CacheStats::new(capacity),
            capacity,
        })
    }

    // == Get ==
    /// Looks up `key`, promoting it to most recently used when present.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        match self.index.get(key) {
            Some(&id) => {
                self.list.promote_to_most_recent(id);
                self.stats.record_hit();
                Some(self.list.value(id))
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// Overwrites in place when the key exists. Otherwise, if the store is
    /// full, the least recently used entry is evicted first.
    pub fn set(&mut self, key: String, value: V) {
        if let Some(&id) = self.index.get(&key) {
            *self.list.value_mut(id) = value;
            self.list.promote_to_most_recent(id);
        } else {
            if self.list.len() == self.capacity {
                let evicted = self.list.evict_least_recent();
                self.index.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "evicted least recently used entry");
            }

            let id = self.list.append_most_recent(key.clone(), value);
            self.index.insert(key, id);
        }

        self.check_invariant();
    }

    // == Flush ==
    /// Removes every entry and returns how many were dropped.
    pub fn flush(&mut self) -> usize {
        let dropped = self.list.len();
        self.index.clear();
        self.list.clear();
        self.check_invariant();
        dropped
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.list.len(),
            ..self.stats.clone()
        }
    }

    // == Inspection ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the fixed maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns keys from least to most recently used. Does not affect recency.
    pub fn keys(&self) -> Vec<String> {
        self.list.keys().map(String::from).collect()
    }

    /// Key of the next eviction candidate.
    pub fn least_recent(&self) -> Option<&str> {
        self.list.head().map(|id| self.list.key(id))
    }

    /// Key of the most recently used entry.
    pub fn most_recent(&self) -> Option<&str> {
        self.list.tail().map(|id| self.list.key(id))
    }

    // == Invariant ==
    /// Asserts that index and list agree and respect the capacity bound.
    ///
    /// # Panics
    /// Panics on any index/list desynchronization.
    fn check_invariant(&self) {
        assert_eq!(
            self.index.len(),
            self.list.len(),
            "cache index and recency list out of sync"
        );
        assert!(
            self.list.len() <= self.capacity,
            "cache holds {} entries, capacity is {}",
            self.list.len(),
            self.capacity
        );
    }
}
