//! In-memory connector for exercising the connection manager without a
//! network.

use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use futures::future::{self, BoxFuture};
use futures::{SinkExt, StreamExt};
use tokio::time::Instant;

use crate::connection::{Connector, Frame, FrameSink, FrameStream};
use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Open succeeds and hands a [`MockPeer`] to the test
    Accept,
    /// Open fails immediately
    Refuse,
    /// Open never completes
    Stall,
}

/// Server side of an accepted mock channel.
pub(crate) struct MockPeer {
    pub to_client: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    pub from_client: mpsc::UnboundedReceiver<Frame>,
}

impl MockPeer {
    pub fn push(&self, frame: Frame) {
        let _ = self.to_client.unbounded_send(Ok(frame));
    }

    pub fn fail(&self, err: TransportError) {
        let _ = self.to_client.unbounded_send(Err(err));
    }
}

struct Inner {
    mode: Mode,
    opens: Vec<Instant>,
    peers: Vec<MockPeer>,
}

#[derive(Clone)]
pub(crate) struct MockConnector {
    inner: Arc<Mutex<Inner>>,
}

impl MockConnector {
    pub fn new(mode: Mode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                mode,
                opens: Vec::new(),
                peers: Vec::new(),
            })),
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.lock().unwrap().mode = mode;
    }

    /// Times at which `open` was called.
    pub fn opens(&self) -> Vec<Instant> {
        self.inner.lock().unwrap().opens.clone()
    }

    pub fn open_count(&self) -> usize {
        self.inner.lock().unwrap().opens.len()
    }

    /// Takes the peer of the most recently accepted channel.
    pub fn take_peer(&self) -> MockPeer {
        self.inner
            .lock()
            .unwrap()
            .peers
            .pop()
            .expect("no accepted channel")
    }
}

impl Connector for MockConnector {
    fn open(&self, _url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>> {
        let mut inner = self.inner.lock().unwrap();
        inner.opens.push(Instant::now());

        match inner.mode {
            Mode::Refuse => Box::pin(future::ready(Err(TransportError::Connect(
                "connection refused".to_string(),
            )))),
            Mode::Stall => Box::pin(future::pending()),
            Mode::Accept => {
                let (to_client, client_rx) = mpsc::unbounded();
                let (client_tx, from_client) = mpsc::unbounded();
                inner.peers.push(MockPeer {
                    to_client,
                    from_client,
                });

                let sink: FrameSink = Box::pin(client_tx.sink_map_err(|_| TransportError::Closed));
                let stream: FrameStream = client_rx.boxed();
                Box::pin(future::ready(Ok((sink, stream))))
            }
        }
    }
}
