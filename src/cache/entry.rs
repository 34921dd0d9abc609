//! Cache Entry Module
//!
//! Defines a stored value tagged with its write time. Staleness is judged
//! only when the entry is read.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and write time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// When the value was written
    pub written_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            written_at: Instant::now(),
        }
    }

    // == Age ==
    /// Time elapsed since the entry was written.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.written_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry is still valid for the given TTL.
    ///
    /// Boundary condition: an entry whose age equals the TTL is stale, so a
    /// value is served only while `age < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
