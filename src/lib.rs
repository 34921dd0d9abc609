//! Clinic Link - resilient client data layer for the clinical console
//!
//! Provides a reconnecting realtime channel, stateful request execution with
//! a shared TTL cache, and pagination over backend listings.

pub mod api;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod pagination;
pub mod request;

pub use api::ApiClient;
pub use cache::{CachePolicy, CacheStore, CachedRequest};
pub use config::Config;
pub use connection::{ChannelState, ConnectionConfig, ConnectionEvent, ConnectionManager, ReconnectPolicy};
pub use error::{OperationError, RequestError, TransportError};
pub use pagination::Paginator;
pub use request::{ExecutorOptions, RequestExecutor};
