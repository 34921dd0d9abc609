//! Connection Module
//!
//! Realtime duplex channel with bounded automatic reconnection.
//!
//! # Lifecycle
//! - `Disconnected -> Connecting -> Connected`
//! - `Connected -> (close) -> Reconnecting -> Connecting -> ...`
//! - `Closed` once the retry budget is spent, `Disconnected` after an
//!   explicit `disconnect()`
//!
//! Only a close schedules a retry. Transport errors are published but never
//! trigger reconnection by themselves.

mod manager;
mod options;
mod state;
mod transport;

#[cfg(test)]
mod mock;

pub use manager::ConnectionManager;
pub use options::{ConnectionConfig, ReconnectPolicy};
pub use state::{ChannelState, CloseInfo, ConnectionEvent, ConnectionSnapshot, InboundMessage, Payload};
pub use transport::{Connector, Frame, FrameSink, FrameStream, WsConnector};

// == Public Constants ==
/// Buffered lifecycle events per subscriber before the slowest one lags
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
