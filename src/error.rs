//! Error types for the data layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Message used when a failure carries nothing readable.
pub const UNKNOWN_ERROR: &str = "unknown error";

// == Transport Error ==
/// Failures of the realtime channel.
///
/// These never reach callers of the connection manager directly; they are
/// published through its error observable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The channel could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The channel did not open within the configured timeout
    #[error("Connection timeout ({0:?})")]
    Timeout(Duration),

    /// Runtime failure on an established channel
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Write attempted on a channel that is already shut
    #[error("Channel closed")]
    Closed,
}

// == Operation Error ==
/// Raw failure produced by a wrapped asynchronous operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Backend answered with a non-success status and a (possibly JSON) body
    #[error("Request rejected with status {status}")]
    Rejected { status: u16, body: Value },

    /// The request never produced a response
    #[error("{0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Failure with no details at all
    #[error("{UNKNOWN_ERROR}")]
    Unknown,
}

impl OperationError {
    /// Collapses the failure into the single message shown to users.
    ///
    /// Prefers a structured `message` field of the response body, then the
    /// failure's own message, then [`UNKNOWN_ERROR`].
    pub fn normalize(&self) -> RequestError {
        let structured = match self {
            OperationError::Rejected { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            _ => None,
        };

        let own = match self {
            OperationError::Transport(msg) | OperationError::Decode(msg) => {
                Some(msg.clone()).filter(|m| !m.is_empty())
            }
            OperationError::Rejected { .. } => Some(self.to_string()),
            OperationError::Unknown => None,
        };

        RequestError::new(
            structured
                .or(own)
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        )
    }
}

impl From<reqwest::Error> for OperationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OperationError::Decode(err.to_string())
        } else {
            OperationError::Transport(err.to_string())
        }
    }
}

// == Request Error ==
/// Normalized failure stored in request state and returned from `execute`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<OperationError> for RequestError {
    fn from(err: OperationError) -> Self {
        err.normalize()
    }
}

// == Result Type Alias ==
/// Convenience Result type for request execution.
pub type Result<T> = std::result::Result<T, RequestError>;
