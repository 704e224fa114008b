//! lrucache - A fixed-capacity LRU cache server
//!
//! Provides an in-process LRU cache with per-call cancellation and a small
//! JSON-over-HTTP API in front of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{Cache, CancelToken};
pub use config::Config;
pub use error::{CacheError, ConfigError};
