//! Conversation repository — 1:1 conversations and their participant rows.

use ripple_common::models::conversation::Conversation;
use sqlx::PgPool;
use uuid::Uuid;

/// Find the existing conversation between exactly these two users.
pub async fn find_between(
    pool: &PgPool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT c.* FROM conversations c
        INNER JOIN conversation_participants pa ON pa.conversation_id = c.id AND pa.user_id = $1
        INNER JOIN conversation_participants pb ON pb.conversation_id = c.id AND pb.user_id = $2
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await
}

/// Create a conversation between two users.
pub async fn create(
    pool: &PgPool,
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Conversation, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let conversation = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, created_at, updated_at)
        VALUES ($1, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO conversation_participants (conversation_id, user_id)
        VALUES ($1, $2), ($1, $3)
        "#,
    )
    .bind(id)
    .bind(user_a)
    .bind(user_b)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(conversation)
}

/// Return the conversation between two users, creating it on first contact.
pub async fn find_or_create_between(
    pool: &PgPool,
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Conversation, sqlx::Error> {
    if let Some(existing) = find_between(pool, user_a, user_b).await? {
        return Ok(existing);
    }
    create(pool, id, user_a, user_b).await
}

/// List a user's conversations, most recently active first.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT c.* FROM conversations c
        INNER JOIN conversation_participants p ON p.conversation_id = c.id
        WHERE p.user_id = $1
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Participant user IDs of a conversation.
pub async fn participants(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT user_id FROM conversation_participants WHERE conversation_id = $1",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Check whether a user belongs to a conversation.
pub async fn is_participant(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
        )
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
