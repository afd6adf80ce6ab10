//! Conversation model — a private channel between two users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation. Participants live in the `conversation_participants`
/// join table; the struct carries only the row itself.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever a message is appended, so listings sort by activity.
    pub updated_at: DateTime<Utc>,
}

/// Request to open (or return the existing) conversation with another user.
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub receiver_id: Uuid,
}

/// Conversation plus its participant IDs, as returned by the API.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
