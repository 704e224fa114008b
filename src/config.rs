//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default number of cache entries
pub const DEFAULT_CAPACITY: usize = 2048;
/// Default listen address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2376";
/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
/// Longest accepted per-request deadline
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold, never zero
    pub capacity: usize,
    /// Address the HTTP server binds to
    pub server_address: SocketAddr,
    /// Deadline given to every cache call made on behalf of a request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 2048, must be > 0)
    /// - `SERVER_ADDRESS` - Listen address (default: 127.0.0.1:2376)
    /// - `SERVER_REQUEST_TIMEOUT` - Per-request deadline such as `1s` or
    ///   `250ms` (default: 1s, at most 24h)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Unset or empty variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let capacity = match var("CACHE_CAPACITY") {
            Some(raw) => parse_capacity(&raw)?,
            None => DEFAULT_CAPACITY,
        };

        let server_address = match var("SERVER_ADDRESS") {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "SERVER_ADDRESS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => default_address(),
        };

        let request_timeout = match var("SERVER_REQUEST_TIMEOUT") {
            Some(raw) => parse_duration(&raw).map_err(|reason| ConfigError::Invalid {
                var: "SERVER_REQUEST_TIMEOUT",
                value: raw.clone(),
                reason,
            })?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            capacity,
            server_address,
            request_timeout,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            server_address: default_address(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 2376))
}

fn parse_capacity(raw: &str) -> Result<usize, ConfigError> {
    let capacity: usize = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::Invalid {
            var: "CACHE_CAPACITY",
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;

    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity);
    }
    Ok(capacity)
}

/// Parses `<n>ms`, `<n>s`, `<n>m` or a bare number of seconds.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => raw.split_at(split),
        None => (raw, "s"),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| "expected a whole number followed by ms, s or m".to_string())?;

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(
            amount
                .checked_mul(60)
                .ok_or_else(|| "timeout is too large".to_string())?,
        ),
        other => return Err(format!("unknown unit {other:?}")),
    };

    if duration.is_zero() {
        return Err("timeout must be greater than 0".to_string());
    }
    if duration > MAX_REQUEST_TIMEOUT {
        return Err(format!(
            "timeout must not exceed {}s",
            MAX_REQUEST_TIMEOUT.as_secs()
        ));
    }
    Ok(duration)
}
