//! Channel transport
//!
//! The [`Connector`] seam between the connection manager and the network,
//! and its WebSocket implementation over tokio-tungstenite.

use std::pin::Pin;

use futures::future::{self, BoxFuture};
use futures::stream::BoxStream;
use futures::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;

use crate::connection::{CloseInfo, Payload};
use crate::error::TransportError;

/// Unit exchanged over an open channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Payload),
    Close(Option<CloseInfo>),
}

/// Outgoing half of an open channel.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = TransportError> + Send>>;

/// Incoming half of an open channel. Ends when the transport is gone.
pub type FrameStream = BoxStream<'static, Result<Frame, TransportError>>;

/// Opens channels to an endpoint address.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>>;
}

// == WebSocket Connector ==
/// [`Connector`] speaking WebSocket (ws:// and wss://).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            debug!(%url, status = %response.status(), "websocket handshake complete");

            let (sink, stream) = ws.split();
            let sink = sink
                .sink_map_err(|e| TransportError::Protocol(e.to_string()))
                .with(|frame: Frame| future::ready(Ok::<_, TransportError>(into_message(frame))));
            let stream = stream.filter_map(|msg| future::ready(from_message(msg)));

            Ok((Box::pin(sink) as FrameSink, stream.boxed()))
        })
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Message(Payload::Text(text)) => Message::Text(text),
        Frame::Message(Payload::Binary(bytes)) => Message::Binary(bytes),
        Frame::Close(info) => Message::Close(info.map(|info| CloseFrame {
            code: CloseCode::from(info.code),
            reason: info.reason.into(),
        })),
    }
}

/// Control frames (ping/pong) are answered by tungstenite and skipped here.
fn from_message(msg: Result<Message, tungstenite::Error>) -> Option<Result<Frame, TransportError>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(Frame::Message(Payload::Text(text)))),
        Ok(Message::Binary(bytes)) => Some(Ok(Frame::Message(Payload::Binary(bytes)))),
        Ok(Message::Close(frame)) => Some(Ok(Frame::Close(frame.map(|frame| CloseInfo {
            code: u16::from(frame.code),
            reason: frame.reason.into_owned(),
        })))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(e) => Some(Err(TransportError::Protocol(e.to_string()))),
    }
}
