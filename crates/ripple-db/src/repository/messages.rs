//! Message repository — append and history listing.

use ripple_common::models::message::Message;
use sqlx::PgPool;
use uuid::Uuid;

/// Append a message to a conversation and bump the conversation's activity
/// timestamp.
pub async fn append_message(
    pool: &PgPool,
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> Result<Message, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, text, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(text)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(message)
}

/// List messages in a conversation, newest first.
///
/// Keyset pagination on the v7 message ID: pass the oldest ID from the
/// previous page as `before` to fetch the page preceding it.
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: Uuid,
    before: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    match before {
        Some(before_id) => {
            sqlx::query_as::<_, Message>(
                r#"
                SELECT * FROM messages
                WHERE conversation_id = $1 AND id < $2
                ORDER BY id DESC
                LIMIT $3
                "#,
            )
            .bind(conversation_id)
            .bind(before_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Message>(
                r#"
                SELECT * FROM messages
                WHERE conversation_id = $1
                ORDER BY id DESC
                LIMIT $2
                "#,
            )
            .bind(conversation_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}
