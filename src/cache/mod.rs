//! Cache Module
//!
//! Shared in-memory cache of time-limited values with lazy expiry, and the
//! cache-through request wrapper built on it.

mod cached;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use cached::{CachePolicy, CachedRequest};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;
