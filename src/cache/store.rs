//! Cache Store Module
//!
//! Shared keyed store of time-limited values with lazy expiry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

// == Cache Store ==
/// Handle to a shared cache registry.
///
/// Cloning the handle shares the underlying map, so every executor built over
/// clones of one store observes the others' writes. Independent stores are
/// fully isolated. The TTL is supplied per read: entries are never evicted in
/// the background, a stale entry stays in place until overwritten or cleared.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<Inner>>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty, unshared store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Returns the value under `key` if it was written less than `ttl` ago.
    ///
    /// A stale entry behaves as absent but is left untouched.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        let mut inner = self.write();
        let fresh = inner
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.value.clone());

        match fresh {
            Some(value) => {
                inner.stats.record_hit();
                debug!(key, "cache hit");
                Some(value)
            }
            None => {
                inner.stats.record_miss();
                debug!(key, "cache miss");
                None
            }
        }
    }

    /// Typed variant of [`get`](Self::get).
    ///
    /// A fresh entry that does not decode as `T` is treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let value = self.get(key, ttl)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, error = %err, "cached value has unexpected shape");
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` stamped with the current time, replacing
    /// any previous entry.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut inner = self.write();
        inner.entries.insert(key.into(), CacheEntry::new(value));
        inner.stats.record_write();
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
    }

    /// Typed variant of [`set`](Self::set). Returns false if `value` cannot
    /// be represented as JSON, in which case nothing is stored.
    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> bool {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(json) => {
                self.set(key, json);
                true
            }
            Err(err) => {
                warn!(key = %key, error = %err, "value not cacheable");
                false
            }
        }
    }

    // == Clear ==
    /// Removes the entry under `key` so the next read misses.
    pub fn clear(&self, key: &str) {
        let mut inner = self.write();
        if inner.entries.remove(key).is_some() {
            inner.stats.record_clear();
            let len = inner.entries.len();
            inner.stats.set_total_entries(len);
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.read();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}
