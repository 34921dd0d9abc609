//! API Module
//!
//! JSON client for the REST backend. Its endpoints are operations that
//! request executors, cached requests and paginators can wrap.

pub mod client;

pub use client::ApiClient;
