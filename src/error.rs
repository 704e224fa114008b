//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CancelReason;

// == Cache Error Enum ==
/// Unified error type for cache operations and their HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache constructed with a capacity of zero
    #[error("Capacity must be greater than 0")]
    InvalidCapacity,

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Caller's token was cancelled before the operation reported back
    #[error("Operation cancelled")]
    Cancelled,

    /// Caller's deadline passed before the operation reported back
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the outcomes produced by a fired cancellation token.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CacheError::Cancelled | CacheError::DeadlineExceeded)
    }
}

impl From<CancelReason> for CacheError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => CacheError::Cancelled,
            CancelReason::DeadlineExceeded => CacheError::DeadlineExceeded,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            CacheError::NotFound(_) => (StatusCode::NOT_FOUND, "not found".to_string()),
            CacheError::Cancelled | CacheError::DeadlineExceeded => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout".to_string())
            }
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::InvalidCapacity | CacheError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "detail": detail
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Config Error Enum ==
/// Errors raised while loading configuration from the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// CACHE_CAPACITY was set to zero
    #[error("CACHE_CAPACITY must be greater than 0")]
    ZeroCapacity,

    /// A variable was present but could not be parsed
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
