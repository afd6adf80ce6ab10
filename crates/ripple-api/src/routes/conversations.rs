//! Conversation and message-history routes.
//!
//! This is the persistence side of chat: the gateway relays live copies,
//! these endpoints own the authoritative history. Appending here does not
//! fan out to connected sockets — live delivery is exclusively the
//! gateway's `sendMessage` path.

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    routing::get,
};
use ripple_common::{
    error::{RippleError, RippleResult},
    id,
    models::{
        conversation::{Conversation, ConversationResponse, CreateConversationRequest},
        message::{CreateMessageRequest, Message},
    },
    validation::validate_request,
};
use ripple_db::repository::{conversations, messages, users};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{AppState, middleware::AuthContext};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(list_messages).post(append_message),
        )
}

async fn to_response(
    state: &AppState,
    conversation: Conversation,
) -> RippleResult<ConversationResponse> {
    let participants = conversations::participants(&state.db.pool, conversation.id).await?;
    Ok(ConversationResponse {
        id: conversation.id,
        participants,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    })
}

/// POST /api/v1/conversations — open (or return) the conversation with
/// another user.
async fn create_conversation(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateConversationRequest>,
) -> RippleResult<Json<ConversationResponse>> {
    if body.receiver_id == auth.user_id {
        return Err(RippleError::Validation {
            message: "Cannot open a conversation with yourself".into(),
        });
    }

    // Verify the other user exists
    users::find_by_id(&state.db.pool, body.receiver_id)
        .await?
        .ok_or(RippleError::NotFound {
            resource: "User".into(),
        })?;

    let conversation = conversations::find_or_create_between(
        &state.db.pool,
        id::generate_id(),
        auth.user_id,
        body.receiver_id,
    )
    .await?;

    Ok(Json(to_response(&state, conversation).await?))
}

/// GET /api/v1/conversations — the current user's conversations, most
/// recently active first.
async fn list_conversations(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> RippleResult<Json<Vec<ConversationResponse>>> {
    let rows = conversations::list_for_user(&state.db.pool, auth.user_id).await?;

    let mut results = Vec::with_capacity(rows.len());
    for conversation in rows {
        results.push(to_response(&state, conversation).await?);
    }
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    /// Fetch messages older than this message ID (keyset pagination).
    before: Option<Uuid>,
    limit: Option<i64>,
}

/// GET /api/v1/conversations/{id}/messages — history, newest first.
async fn list_messages(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> RippleResult<Json<Vec<Message>>> {
    if !conversations::is_participant(&state.db.pool, conversation_id, auth.user_id).await? {
        return Err(RippleError::Forbidden);
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let history =
        messages::list_messages(&state.db.pool, conversation_id, query.before, limit).await?;
    Ok(Json(history))
}

/// POST /api/v1/conversations/{id}/messages — append to history.
async fn append_message(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<CreateMessageRequest>,
) -> RippleResult<Json<Message>> {
    validate_request(&body)?;

    let config = ripple_common::config::get();
    if body.text.chars().count() > config.limits.max_message_length as usize {
        return Err(RippleError::Validation {
            message: format!(
                "Message exceeds {} characters",
                config.limits.max_message_length
            ),
        });
    }

    if !conversations::is_participant(&state.db.pool, conversation_id, auth.user_id).await? {
        return Err(RippleError::Forbidden);
    }

    let message = messages::append_message(
        &state.db.pool,
        id::generate_id(),
        conversation_id,
        auth.user_id,
        &body.text,
    )
    .await?;

    Ok(Json(message))
}
