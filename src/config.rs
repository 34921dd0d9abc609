//! Configuration Module
//!
//! Handles loading client configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::connection::{ConnectionConfig, ReconnectPolicy};

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Realtime channel endpoint
    pub ws_url: String,
    /// Base URL of the REST backend
    pub api_url: String,
    /// Fixed delay between reconnect attempts in milliseconds
    pub reconnect_interval_ms: u64,
    /// Reconnect attempts allowed after a close before giving up
    pub max_reconnect_attempts: u32,
    /// Time allowed for a channel to open in milliseconds
    pub connect_timeout_ms: u64,
    /// Freshness window for cached responses in milliseconds
    pub cache_ttl_ms: u64,
    /// Default page size for paginated lists
    pub page_size: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CLINIC_WS_URL` - Realtime endpoint (default: ws://127.0.0.1:8080/ws)
    /// - `CLINIC_API_URL` - REST backend (default: http://127.0.0.1:8080)
    /// - `RECONNECT_INTERVAL_MS` - Retry interval (default: 3000)
    /// - `MAX_RECONNECT_ATTEMPTS` - Retry budget (default: 5)
    /// - `CONNECT_TIMEOUT_MS` - Open timeout (default: 10000)
    /// - `CACHE_TTL_MS` - Cache freshness window (default: 300000)
    /// - `PAGE_SIZE` - Page size (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ws_url: env::var("CLINIC_WS_URL").unwrap_or(defaults.ws_url),
            api_url: env::var("CLINIC_API_URL").unwrap_or(defaults.api_url),
            reconnect_interval_ms: parse_var("RECONNECT_INTERVAL_MS")
                .unwrap_or(defaults.reconnect_interval_ms),
            max_reconnect_attempts: parse_var("MAX_RECONNECT_ATTEMPTS")
                .unwrap_or(defaults.max_reconnect_attempts),
            connect_timeout_ms: parse_var("CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.connect_timeout_ms),
            cache_ttl_ms: parse_var("CACHE_TTL_MS").unwrap_or(defaults.cache_ttl_ms),
            page_size: parse_var("PAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
        }
    }

    /// Channel settings derived from this configuration.
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            policy: ReconnectPolicy::new(
                Duration::from_millis(self.reconnect_interval_ms),
                self.max_reconnect_attempts,
            ),
            connect_timeout: Some(Duration::from_millis(self.connect_timeout_ms)),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/ws".to_string(),
            api_url: "http://127.0.0.1:8080".to_string(),
            reconnect_interval_ms: 3000,
            max_reconnect_attempts: 5,
            connect_timeout_ms: 10_000,
            cache_ttl_ms: 300_000,
            page_size: 10,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
