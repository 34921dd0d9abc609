//! Connection Manager
//!
//! Owns one realtime channel, delivers inbound messages to subscribers and
//! re-opens the channel on a fixed interval after it closes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::{
    ChannelState, CloseInfo, ConnectionConfig, ConnectionEvent, ConnectionSnapshot, Connector,
    Frame, InboundMessage, Payload, WsConnector, EVENT_CHANNEL_CAPACITY,
};
use crate::error::TransportError;

/// Handles owned by the manager. Every (re)connect and every disconnect
/// bumps `generation`; callbacks from a channel of an older generation are
/// ignored.
#[derive(Default)]
struct Resources {
    generation: u64,
    channel: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<Payload>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

struct Shared {
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    state: watch::Sender<ConnectionSnapshot>,
    events: broadcast::Sender<ConnectionEvent>,
    resources: Mutex<Resources>,
}

// == Connection Manager ==
/// Manager of one realtime duplex channel.
///
/// Channel failures never surface as errors to callers: they are published
/// on the snapshot (`watch`) and event (`subscribe`) observables. Dropping
/// the manager disconnects it.
///
/// # Example
/// ```ignore
/// let manager = ConnectionManager::new(ConnectionConfig::new("ws://127.0.0.1:8080/ws"));
/// let mut events = manager.subscribe();
/// manager.connect();
/// while let Ok(event) = events.recv().await {
///     // ...
/// }
/// ```
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    // == Constructor ==
    /// Creates a manager speaking WebSocket. Nothing is opened until
    /// [`connect`](Self::connect).
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, WsConnector)
    }

    pub fn with_connector(config: ConnectionConfig, connector: impl Connector) -> Self {
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                config,
                connector: Box::new(connector),
                state,
                events,
                resources: Mutex::new(Resources::default()),
            }),
        }
    }

    // == Connect ==
    /// Opens a fresh channel, force-closing the current one and cancelling
    /// any pending retry first. Must be called within a tokio runtime.
    pub fn connect(&self) {
        let mut res = self.shared.lock();
        if let Some(timer) = res.reconnect_timer.take() {
            timer.abort();
        }
        self.shared.open_channel(&mut res);
    }

    // == Disconnect ==
    /// Closes the channel and cancels any pending retry. No automatic
    /// reconnection happens afterwards.
    pub fn disconnect(&self) {
        self.shared.shutdown();
    }

    // == Send ==
    /// Queues `payload` on the open channel.
    ///
    /// Returns false, doing nothing, unless the channel is connected.
    pub fn send(&self, payload: impl Into<Payload>) -> bool {
        let res = self.shared.lock();
        if !self.is_connected() {
            return false;
        }
        match &res.outbound {
            Some(outbound) => outbound.send(payload.into()).is_ok(),
            None => false,
        }
    }

    // == Accessors ==
    pub fn is_connected(&self) -> bool {
        self.shared.state.borrow().is_connected()
    }

    pub fn state(&self) -> ChannelState {
        self.shared.state.borrow().state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.borrow().reconnect_attempts
    }

    pub fn last_message(&self) -> Option<InboundMessage> {
        self.shared.state.borrow().last_message.clone()
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.shared.state.borrow().last_error.clone()
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn watch(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.shared.state.subscribe()
    }

    /// Receiver of lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.events.subscribe()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Resources> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ConnectionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn open_channel(self: &Arc<Self>, res: &mut Resources) {
        res.generation += 1;
        if let Some(previous) = res.channel.take() {
            previous.abort();
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        res.outbound = Some(outbound_tx);

        let generation = res.generation;
        self.state
            .send_modify(|snapshot| snapshot.state = ChannelState::Connecting);
        info!(url = %self.config.url, generation, "connecting");

        let shared = Arc::clone(self);
        res.channel = Some(tokio::spawn(async move {
            shared.run_channel(generation, outbound_rx).await;
        }));
    }

    fn shutdown(&self) {
        let mut res = self.lock();
        res.generation += 1;
        if let Some(timer) = res.reconnect_timer.take() {
            timer.abort();
        }

        // Dropping the sender lets an open channel send its close frame and
        // finish on its own; anything still opening is cut off.
        res.outbound = None;
        let was_connected = self.state.borrow().is_connected();
        if let Some(channel) = res.channel.take() {
            if !was_connected {
                channel.abort();
            }
        }

        let previous = self.state.borrow().state;
        if previous != ChannelState::Disconnected {
            self.state
                .send_modify(|snapshot| snapshot.state = ChannelState::Disconnected);
            info!(url = %self.config.url, %previous, "disconnected");
        }
    }

    async fn run_channel(
        self: Arc<Self>,
        generation: u64,
        mut outbound: mpsc::UnboundedReceiver<Payload>,
    ) {
        let opening = self.connector.open(&self.config.url);
        let opened = match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, opening)
                .await
                .unwrap_or_else(|_| Err(TransportError::Timeout(limit))),
            None => opening.await,
        };

        let (mut sink, mut stream) = match opened {
            Ok(halves) => halves,
            Err(err) => {
                self.handle_error(generation, err);
                self.handle_close(generation, None);
                return;
            }
        };

        if !self.handle_open(generation) {
            return;
        }

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Message(payload))) => self.handle_message(generation, payload),
                    Some(Ok(Frame::Close(info))) => {
                        self.handle_close(generation, info);
                        return;
                    }
                    Some(Err(err)) => self.handle_error(generation, err),
                    None => {
                        self.handle_close(generation, None);
                        return;
                    }
                },
                queued = outbound.recv() => match queued {
                    Some(payload) => {
                        if let Err(err) = sink.send(Frame::Message(payload)).await {
                            self.handle_error(generation, err);
                        }
                    }
                    None => {
                        debug!(generation, "channel released, closing");
                        let _ = sink.send(Frame::Close(Some(CloseInfo::normal()))).await;
                        let _ = sink.close().await;
                        return;
                    }
                },
            }
        }
    }

    fn handle_open(&self, generation: u64) -> bool {
        let res = self.lock();
        if res.generation != generation {
            return false;
        }

        self.state.send_modify(|snapshot| {
            snapshot.state = ChannelState::Connected;
            snapshot.reconnect_attempts = 0;
        });
        info!(url = %self.config.url, "channel open");
        self.publish(ConnectionEvent::Open);
        true
    }

    fn handle_message(&self, generation: u64, payload: Payload) {
        let res = self.lock();
        if res.generation != generation {
            return;
        }

        debug!(bytes = payload.len(), "message received");
        let message = InboundMessage::new(payload);
        self.state
            .send_modify(|snapshot| snapshot.last_message = Some(message.clone()));
        self.publish(ConnectionEvent::Message(message));
    }

    /// Records the error. Reconnection is left to the close that follows.
    fn handle_error(&self, generation: u64, err: TransportError) {
        let res = self.lock();
        if res.generation != generation {
            return;
        }

        warn!(url = %self.config.url, error = %err, "channel error");
        self.state
            .send_modify(|snapshot| snapshot.last_error = Some(err.clone()));
        self.publish(ConnectionEvent::Error(err));
    }

    fn handle_close(self: &Arc<Self>, generation: u64, info: Option<CloseInfo>) {
        let mut res = self.lock();
        if res.generation != generation {
            return;
        }
        // The closing task is the caller; release its handle without aborting
        res.channel = None;
        res.outbound = None;

        let policy = self.config.policy;
        let attempts = self.state.borrow().reconnect_attempts;
        if policy.allows(attempts) {
            let attempt = attempts + 1;
            self.state.send_modify(|snapshot| {
                snapshot.state = ChannelState::Reconnecting;
                snapshot.reconnect_attempts = attempt;
            });
            info!(
                attempt,
                max = policy.max_attempts(),
                delay_ms = policy.interval().as_millis() as u64,
                "channel closed, scheduling reconnect"
            );

            let shared = Arc::clone(self);
            res.reconnect_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(policy.interval()).await;
                shared.reconnect_due(generation);
            }));
        } else {
            self.state
                .send_modify(|snapshot| snapshot.state = ChannelState::Closed);
            warn!(
                url = %self.config.url,
                attempts,
                "channel closed, reconnect attempts exhausted"
            );
        }

        self.publish(ConnectionEvent::Close(info));
    }

    fn reconnect_due(self: &Arc<Self>, generation: u64) {
        let mut res = self.lock();
        if res.generation != generation {
            return;
        }
        // This task is the timer; drop the handle instead of aborting it
        res.reconnect_timer = None;
        self.open_channel(&mut res);
    }
}
