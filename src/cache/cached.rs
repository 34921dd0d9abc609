//! Cache-through requests
//!
//! A request executor whose operation consults a shared [`CacheStore`]
//! before hitting the backend.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::models::ApiResponse;
use crate::request::{Operation, OperationFuture, RequestExecutor};

/// Where and for how long a request's result is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub key: String,
    pub ttl: Duration,
}

impl CachePolicy {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }

    /// Policy for `key` with the configured cache TTL.
    pub fn from_config(key: impl Into<String>, config: &Config) -> Self {
        Self::new(key, config.cache_ttl())
    }
}

/// Operation adapter that serves fresh cache entries and writes through
/// successful results.
struct CacheThrough<O> {
    inner: O,
    cache: CacheStore,
    policy: CachePolicy,
    hit: Arc<AtomicBool>,
}

impl<A, T, O> Operation<A, T> for CacheThrough<O>
where
    O: Operation<A, T>,
    A: Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn call(&self, args: A) -> OperationFuture<T> {
        if let Some(data) = self.cache.get_as::<T>(&self.policy.key, self.policy.ttl) {
            self.hit.store(true, Ordering::SeqCst);
            return Box::pin(future::ready(Ok(ApiResponse::new(data))));
        }

        self.hit.store(false, Ordering::SeqCst);
        let call = self.inner.call(args);
        let cache = self.cache.clone();
        let key = self.policy.key.clone();

        Box::pin(async move {
            let response = call.await?;
            debug!(key = %key, "caching fresh response");
            cache.set_as(key, &response.data);
            Ok(response)
        })
    }
}

// == Cached Request ==
/// Request executor backed by a shared cache entry.
///
/// Each `execute` first probes the store under the policy key. A fresh entry
/// is returned without invoking the operation and marks the call as a cache
/// hit; otherwise the operation runs and its successful result is written
/// back before flowing through the executor's normal success path.
pub struct CachedRequest<A, T> {
    executor: RequestExecutor<A, T>,
    cache: CacheStore,
    policy: CachePolicy,
    hit: Arc<AtomicBool>,
}

impl<A, T> CachedRequest<A, T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(operation: impl Operation<A, T>, cache: CacheStore, policy: CachePolicy) -> Self {
        let hit = Arc::new(AtomicBool::new(false));
        let executor = RequestExecutor::new(CacheThrough {
            inner: operation,
            cache: cache.clone(),
            policy: policy.clone(),
            hit: Arc::clone(&hit),
        });

        Self {
            executor,
            cache,
            policy,
            hit,
        }
    }

    pub fn execute(&self, args: A) -> impl Future<Output = Result<T>> + Send + 'static {
        self.executor.execute(args)
    }

    // == Force Refresh ==
    /// Drops the cached entry and executes, so the operation always runs.
    pub fn force_refresh(&self, args: A) -> impl Future<Output = Result<T>> + Send + 'static {
        self.cache.clear(&self.policy.key);
        self.execute(args)
    }

    /// Whether the most recent invocation was answered from the cache.
    pub fn is_cache_hit(&self) -> bool {
        self.hit.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.hit.store(false, Ordering::SeqCst);
        self.executor.reset();
    }

    /// The underlying executor, for reading data, loading and error state.
    pub fn executor(&self) -> &RequestExecutor<A, T> {
        &self.executor
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }
}
