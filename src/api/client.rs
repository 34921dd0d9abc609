//! API Client
//!
//! Thin reqwest wrapper producing `{data: T}` envelopes or structured
//! operation errors.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::OperationError;
use crate::models::ApiResponse;
use crate::request::Operation;

/// Client for one backend base URL. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Creates a client for the configured backend.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // == GET ==
    /// Issues `GET path?query` and decodes the `{data: T}` envelope.
    ///
    /// A non-success status becomes [`OperationError::Rejected`] carrying
    /// the response body (JSON when it parses, null otherwise).
    pub async fn get<Q, T>(&self, path: &str, query: &Q) -> Result<ApiResponse<T>, OperationError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            debug!(%url, status = status.as_u16(), "request rejected");
            return Err(OperationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<ApiResponse<T>>().await?)
    }

    // == Endpoint ==
    /// The `GET path` endpoint as an operation, with its arguments sent as
    /// query parameters.
    pub fn endpoint<Q, T>(&self, path: impl Into<String>) -> impl Operation<Q, T>
    where
        Q: Serialize + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let path = path.into();
        move |query: Q| {
            let client = client.clone();
            let path = path.clone();
            async move { client.get(&path, &query).await }
        }
    }
}
