//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{Cache, CancelToken};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{AckResponse, GetResponse, HealthResponse, SetRequest, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared LRU cache holding arbitrary JSON values
    pub cache: Cache<Value>,
    /// Deadline applied to each cache call made for a request
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache<Value>, request_timeout: Duration) -> Self {
        Self {
            cache,
            request_timeout,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = Cache::new(config.capacity)?;
        Ok(Self::new(cache, config.request_timeout))
    }

    /// Fresh token for one request.
    fn token(&self) -> CancelToken {
        CancelToken::with_timeout(self.request_timeout)
    }
}

/// Logs the outcome of a failed cache call before it is turned into a response.
fn log_failure(op: &str, err: &CacheError) {
    match err {
        CacheError::NotFound(key) => info!(op, key = %key, "not found"),
        err if err.is_timeout() => warn!(op, error = %err, "cache call timed out"),
        err => warn!(op, error = %err, "cache call failed"),
    }
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let result = match state.cache.get(&state.token(), key.clone()).await {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(CacheError::NotFound(key.clone())),
        Err(err) => Err(err),
    };

    match result {
        Ok(value) => {
            info!(key = %key, "GET: ok");
            Ok(Json(GetResponse::new(key, value)))
        }
        Err(err) => {
            log_failure("get", &err);
            Err(err)
        }
    }
}

/// Handler for POST /set
///
/// Stores a JSON value under a key. The body is parsed here rather than by
/// the `Json` extractor so that malformed input gets the same error shape as
/// every other failure.
pub async fn set_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<AckResponse>> {
    let req: SetRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected malformed set request");
        CacheError::InvalidRequest("invalid request body".to_string())
    })?;

    if let Some(error_msg) = req.validate() {
        warn!(reason = %error_msg, "rejected set request");
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = req.key;
    if let Err(err) = state.cache.set(&state.token(), key.clone(), req.value).await {
        log_failure("set", &err);
        return Err(err);
    }

    info!(key = %key, "SET: ok");
    Ok(Json(AckResponse::ok()))
}

/// Handler for GET /flush
///
/// Drops every cached entry.
pub async fn flush_handler(State(state): State<AppState>) -> Result<Json<AckResponse>> {
    match state.cache.flush(&state.token()).await {
        Ok(dropped) => {
            info!(dropped, "FLUSH: ok");
            Ok(Json(AckResponse::ok()))
        }
        Err(err) => {
            log_failure("flush", &err);
            Err(err)
        }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(Cache::new(100).unwrap(), Duration::from_secs(1))
    }

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(
            State(state.clone()),
            body(json!({"key": "test_key", "value": [1, "two"]})),
        )
        .await;
        assert_eq!(result.unwrap().message, "ok");

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.key, "test_key");
        assert_eq!(response.value, json!([1, "two"]));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(key)) if key == "nonexistent"));
    }

    #[tokio::test]
    async fn test_set_empty_key() {
        let state = test_state();

        let result = set_handler(State(state), body(json!({"key": "", "value": true}))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(msg)) if msg == "key is required"));
    }

    #[tokio::test]
    async fn test_set_malformed_body() {
        let state = test_state();

        let result = set_handler(State(state), Bytes::from_static(b"{\"key\":not_str}")).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_flush_handler() {
        let state = test_state();
        set_handler(State(state.clone()), body(json!({"key": "a", "value": 1})))
            .await
            .unwrap();

        flush_handler(State(state.clone())).await.unwrap();

        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 1);
        assert_eq!(response.capacity, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_expired_request_deadline_times_out() {
        let state = AppState::new(Cache::new(4).unwrap(), Duration::ZERO);

        let result = get_handler(State(state), Path("k".to_string())).await;
        assert!(matches!(result, Err(CacheError::DeadlineExceeded)));
    }
}
