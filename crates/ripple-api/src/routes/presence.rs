//! Presence route — REST view of the gateway's connection registry.
//!
//! The WebSocket `getOnlineUsers` broadcast is the live channel; this
//! endpoint serves the same snapshot to clients that poll before (or
//! instead of) opening a socket.

use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/presence/online", get(online_users))
}

/// GET /api/v1/presence/online — the currently online user IDs.
async fn online_users(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.online_user_ids().await)
}
