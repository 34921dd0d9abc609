//! Request and Response models
//!
//! Shapes exchanged between the data layer and backend operations.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{PageParams, PagedQuery};
pub use responses::{ApiResponse, PageData};
