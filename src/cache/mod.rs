//! Cache Module
//!
//! Fixed-capacity in-memory cache with strict LRU eviction and per-call
//! cancellation.

mod cancel;
mod engine;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use cancel::{CancelReason, CancelToken};
pub use engine::Cache;
pub use lru::{EntryId, EntryList, Keys};
pub use stats::CacheStats;
pub use store::CacheStore;
