//! Pagination Module
//!
//! Page tracking layered over a request executor.

mod paginator;

pub use paginator::Paginator;
