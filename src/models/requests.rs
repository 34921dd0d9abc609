//! Request parameter models
//!
//! Typed page parameters injected into paginated operations.

use serde::{Deserialize, Serialize};

/// Page position, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// First page with the given size.
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }
}

/// Arguments of a paginated operation: caller filter plus page position.
///
/// Serializes flat, so `PagedQuery { filter: {"patientId": "p1"}, .. }` goes
/// over the wire as `{"patientId": "p1", "page": 3, "pageSize": 10}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedQuery<P> {
    #[serde(flatten)]
    pub filter: P,
    #[serde(flatten)]
    pub page: PageParams,
}

impl<P> PagedQuery<P> {
    pub fn new(filter: P, page: PageParams) -> Self {
        Self { filter, page }
    }

    /// Same filter at a different page position.
    pub fn with_page(&self, page: PageParams) -> Self
    where
        P: Clone,
    {
        Self {
            filter: self.filter.clone(),
            page,
        }
    }
}
