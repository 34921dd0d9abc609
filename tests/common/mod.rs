//! Mock clinic backend shared by the integration tests.
//!
//! Serves a paginated patient listing, a failing endpoint and an echo
//! WebSocket on an ephemeral local port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const TOTAL_PATIENTS: u64 = 25;

/// Close code the echo socket uses when asked to hang up.
pub const SERVER_CLOSE_CODE: u16 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,
    pub ward: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WardFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
}

impl WardFilter {
    pub fn ward(ward: &str) -> Self {
        Self {
            ward: Some(ward.to_string()),
        }
    }
}

#[derive(Clone, Default)]
pub struct Backend {
    pub patient_requests: Arc<AtomicUsize>,
    pub ws_accepts: Arc<AtomicUsize>,
}

impl Backend {
    pub fn patient_requests(&self) -> usize {
        self.patient_requests.load(Ordering::SeqCst)
    }

    pub fn ws_accepts(&self) -> usize {
        self.ws_accepts.load(Ordering::SeqCst)
    }
}

/// Starts the backend and returns its address.
pub async fn spawn_backend() -> (SocketAddr, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/patients", get(list_patients))
        .route("/api/broken", get(broken))
        .route("/ws", get(ws_handler))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, backend)
}

/// A local address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

// == Handlers ==

async fn list_patients(
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend.patient_requests.fetch_add(1, Ordering::SeqCst);

    let page: u64 = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let page_size: u64 = params
        .get("pageSize")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let ward = params.get("ward").cloned().unwrap_or_else(|| "general".to_string());

    let start = (page.saturating_sub(1)) * page_size;
    if page == 0 || page_size == 0 || start >= TOTAL_PATIENTS {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "page out of range" })),
        )
            .into_response();
    }

    let end = (start + page_size).min(TOTAL_PATIENTS);
    let items: Vec<Patient> = (start + 1..=end)
        .map(|id| Patient {
            id,
            ward: ward.clone(),
        })
        .collect();

    Json(json!({ "data": { "items": items, "total": TOTAL_PATIENTS } })).into_response()
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn ws_handler(ws: WebSocketUpgrade, State(backend): State<Backend>) -> Response {
    backend.ws_accepts.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(echo)
}

/// Echoes text and binary messages. The text "close" makes the server hang
/// up with [`SERVER_CLOSE_CODE`].
async fn echo(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        let sent = match msg {
            Message::Text(text) => {
                if text == "close" {
                    let _ = socket
                        .send(Message::Close(Some(CloseFrame {
                            code: SERVER_CLOSE_CODE,
                            reason: "bye".into(),
                        })))
                        .await;
                    return;
                }
                socket.send(Message::Text(text)).await
            }
            Message::Binary(bytes) => socket.send(Message::Binary(bytes)).await,
            Message::Close(_) => return,
            _ => Ok(()),
        };
        if sent.is_err() {
            return;
        }
    }
}
