//! # ripple-gateway
//!
//! Real-time WebSocket gateway for Ripple. Handles:
//! - Client connections, authenticated at the handshake
//! - Presence registration and full-state online-set broadcasts
//! - Live chat-message relay (with fire-and-forget persistence hand-off)
//! - WebRTC call signaling — SDP offers/answers and ICE candidates relayed
//!   verbatim between two peers; media never touches this server
//!
//! The gateway holds no durable state. Everything it knows — who is online,
//! which calls are ringing — lives in memory and dies with the process.

pub mod calls;
pub mod events;
pub mod handler;
pub mod registry;
pub mod switchboard;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use ripple_common::auth::Claims;
use ripple_common::error::RippleError;
use serde::Deserialize;
use tokio::sync::mpsc;

use calls::PendingCalls;
use events::{ClientEvent, ServerEvent};
use switchboard::Switchboard;

pub use handler::MessageRecord;
pub use registry::{ConnectionEntry, ConnectionRegistry};

/// Gateway tunables, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// JWT verification secret shared with the token issuer.
    pub jwt_secret: String,
    /// How long an unanswered call rings before the gateway ends it.
    /// `None` preserves the stock behavior: ring until answered, declined,
    /// or disconnected.
    pub ring_timeout: Option<Duration>,
    /// Per-connection outbound queue depth.
    pub send_buffer: usize,
}

impl GatewayOptions {
    pub fn from_config(config: &ripple_common::config::AppConfig) -> Self {
        Self {
            jwt_secret: config.auth.jwt_secret.clone(),
            ring_timeout: config.gateway.ring_timeout_secs.map(Duration::from_secs),
            send_buffer: config.gateway.send_buffer,
        }
    }
}

/// Gateway state, shared by all connections.
///
/// The registry is injected rather than constructed here so the REST API
/// can serve presence queries off the same instance.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ConnectionRegistry>,
    pub(crate) switchboard: Arc<Switchboard>,
    pub(crate) calls: Arc<PendingCalls>,
    pub(crate) archive_tx: mpsc::Sender<MessageRecord>,
    pub(crate) options: Arc<GatewayOptions>,
}

impl GatewayState {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        archive_tx: mpsc::Sender<MessageRecord>,
        options: GatewayOptions,
    ) -> Self {
        Self {
            registry,
            switchboard: Arc::new(Switchboard::new()),
            calls: Arc::new(PendingCalls::new()),
            archive_tx,
            options: Arc::new(options),
        }
    }
}

/// Build the gateway WebSocket router.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/gateway", get(ws_handler))
        .with_state(Arc::new(state))
}

/// Handshake side channel: the bearer token rides the query string.
#[derive(Debug, Deserialize)]
struct ConnectQuery {
    token: Option<String>,
}

/// WebSocket upgrade handler — the authentication gate.
///
/// The token is verified *before* the upgrade completes; a missing or bad
/// credential means the connection is refused and no event handler ever
/// runs. Checked once per connection, not per event.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    let Some(token) = query.token else {
        return RippleError::Unauthorized.into_response();
    };

    let claims = match ripple_common::auth::validate_token(&token, &state.options.jwt_secret) {
        Ok(claims) if claims.token_type == "access" => claims,
        _ => return RippleError::InvalidToken.into_response(),
    };

    ws.on_upgrade(move |socket| handle_connection(socket, state, claims))
}

/// Handle a single authenticated WebSocket connection.
async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, claims: Claims) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let transport_id = uuid::Uuid::new_v4().to_string();

    let (line_tx, mut line_rx) = mpsc::channel::<ServerEvent>(state.options.send_buffer);
    state.switchboard.attach(transport_id.clone(), line_tx).await;

    tracing::debug!(
        transport = %transport_id,
        user = %claims.username,
        "Gateway connection open"
    );

    // ── Sender task ──────────────────────────────────────────────────────
    // Drains this connection's outbound queue onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = line_rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // ── Receive loop ─────────────────────────────────────────────────────
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                let Ok(event) = serde_json::from_str::<ClientEvent>(&text) else {
                    // Unknown or malformed events are dropped, not answered.
                    tracing::debug!(transport = %transport_id, "Unrecognized event dropped");
                    continue;
                };
                handler::dispatch(&state, &transport_id, &claims, event).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // ── Cleanup ──────────────────────────────────────────────────────────
    // Runs for graceful and abrupt disconnects alike.
    handler::disconnect(&state, &transport_id).await;
    send_task.abort();
}
