//! Connection state and events
//!
//! What observers of a connection manager can see.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::TransportError;

// == Channel State ==
/// Lifecycle position of the managed channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Never connected, or explicitly disconnected
    #[default]
    Disconnected,
    /// A channel is being opened
    Connecting,
    /// Channel open; `send` transmits
    Connected,
    /// Channel lost, a retry is scheduled
    Reconnecting,
    /// Channel lost and the retry budget is spent
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
            ChannelState::Reconnecting => "reconnecting",
            ChannelState::Closed => "closed",
        };
        f.write_str(name)
    }
}

// == Payload ==
/// Opaque message body carried by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

// == Inbound Message ==
/// A received payload stamped with its receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Payload,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            received_at: Utc::now(),
        }
    }
}

// == Close Info ==
/// Close code and reason reported by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    /// Normal closure (1000).
    pub fn normal() -> Self {
        Self {
            code: 1000,
            reason: String::new(),
        }
    }
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code {}", self.code)
        } else {
            write!(f, "{} (code {})", self.reason, self.code)
        }
    }
}

// == Connection Event ==
/// Lifecycle notification fanned out to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Open,
    Message(InboundMessage),
    /// Channel closed; `None` when the transport ended without a close frame
    Close(Option<CloseInfo>),
    Error(TransportError),
}

// == Connection Snapshot ==
/// Observable state of a connection manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSnapshot {
    pub state: ChannelState,
    /// Retries scheduled since the last successful open
    pub reconnect_attempts: u32,
    pub last_message: Option<InboundMessage>,
    pub last_error: Option<TransportError>,
}

impl ConnectionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Connected
    }
}
