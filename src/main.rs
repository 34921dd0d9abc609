//! Clinic Monitor - realtime device feed watcher
//!
//! Connects to the console's realtime endpoint and logs every lifecycle
//! event and inbound message until interrupted.

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_link::connection::{ConnectionEvent, Payload};
use clinic_link::{Config, ConnectionManager};

/// Main entry point for the monitor.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the realtime channel
/// 4. Log events until Ctrl+C / SIGTERM, then disconnect
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_link=info,clinic_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: ws_url={}, reconnect_interval={}ms, max_reconnect_attempts={}",
        config.ws_url, config.reconnect_interval_ms, config.max_reconnect_attempts
    );

    let manager = ConnectionManager::new(config.connection());
    let mut events = manager.subscribe();
    manager.connect();

    let watch = async {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "monitor fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        _ = watch => {}
        result = shutdown_signal() => result.context("failed to listen for shutdown signal")?,
    }

    manager.disconnect();
    info!("Monitor stopped");
    Ok(())
}

fn log_event(event: &ConnectionEvent) {
    match event {
        ConnectionEvent::Open => info!("channel open"),
        ConnectionEvent::Message(message) => match &message.payload {
            Payload::Text(text) => info!(received_at = %message.received_at, "{}", text),
            Payload::Binary(bytes) => {
                info!(received_at = %message.received_at, bytes = bytes.len(), "binary message")
            }
        },
        ConnectionEvent::Close(Some(info)) => warn!(%info, "channel closed"),
        ConnectionEvent::Close(None) => warn!("channel closed"),
        ConnectionEvent::Error(err) => error!(error = %err, "channel error"),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating shutdown...");
        Ok(())
    }
}
