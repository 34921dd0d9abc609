//! Connection options
//!
//! Endpoint and retry configuration, fixed for a manager's lifetime.

use std::time::Duration;

/// Fixed-interval retry budget applied after a channel closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Policy that never retries.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    /// Delay before every retry. No backoff: each attempt waits the same.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another retry may be scheduled after `attempts` retries.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000), 5)
    }
}

/// Everything a [`ConnectionManager`](super::ConnectionManager) needs to
/// reach its endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Endpoint address, e.g. `ws://host/ws`
    pub url: String,
    pub policy: ReconnectPolicy,
    /// Limit for a channel to open; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            policy: ReconnectPolicy::default(),
            connect_timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}
