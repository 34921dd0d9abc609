//! Response envelopes
//!
//! Defines the shapes backend operations resolve with.

use serde::{Deserialize, Serialize};

/// Envelope every backend operation resolves with: the payload wrapped
/// exactly once under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// One page of a listing together with the size of the full result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Default for PageData<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_response_deserialize() {
        let json = r#"{"data": {"items": [{"id": "d1"}], "total": 41}}"#;
        let resp: ApiResponse<PageData<serde_json::Value>> = serde_json::from_str(json).unwrap();

        assert_eq!(resp.data.total, 41);
        assert_eq!(resp.data.items, vec![json!({ "id": "d1" })]);
    }

    #[test]
    fn test_api_response_into_data() {
        let resp = ApiResponse::new(vec![1, 2]);
        assert_eq!(resp.into_data(), vec![1, 2]);
    }

    #[test]
    fn test_page_data_default_is_empty() {
        let page: PageData<String> = PageData::default();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }
}
