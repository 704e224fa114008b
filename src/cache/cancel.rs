//! Cancellation Token Module
//!
//! Caller-side handle that says "stop waiting": a manual cancel signal plus
//! an optional deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

// == Cancel Reason ==
/// Why a token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// `cancel()` was called
    Cancelled,
    /// The deadline passed
    DeadlineExceeded,
}

// == Cancel Token ==
/// Cancellation handle shared between a caller and the operations it starts.
///
/// Clones share the same signal, so cancelling any clone fires all of them.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    signal: watch::Sender<bool>,
    deadline: Option<Instant>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    // == Constructors ==
    /// Creates a token that only fires on `cancel()`.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a token that fires at `deadline` or on `cancel()`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Creates a token that fires after `timeout` or on `cancel()`.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    fn build(deadline: Option<Instant>) -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner { signal, deadline }),
        }
    }

    // == Cancel ==
    /// Fires the manual signal. Calling it again has no effect.
    pub fn cancel(&self) {
        self.inner.signal.send_replace(true);
    }

    // == State ==
    /// Returns true once `cancel()` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.signal.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns why the token has fired, or None if it has not.
    ///
    /// A manual cancel takes precedence over an elapsed deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    // == Wait ==
    /// Resolves once the token fires.
    ///
    /// Returns immediately for a token that has already fired.
    pub async fn cancelled(&self) -> CancelReason {
        if let Some(reason) = self.reason() {
            return reason;
        }

        let mut rx = self.inner.signal.subscribe();
        // The sender lives as long as `self`, so this only returns on a cancel.
        let manual = async move {
            let _ = rx.wait_for(|cancelled| *cancelled).await;
        };

        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = manual => CancelReason::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                manual.await;
                CancelReason::Cancelled
            }
        }
    }
}
