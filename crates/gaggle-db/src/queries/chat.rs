//! Database query functions for the `chat_messages` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatRole};

/// Append one chat turn to a trip's history.
pub async fn append_message(
    pool: &PgPool,
    trip_id: Uuid,
    role: ChatRole,
    content: &str,
) -> Result<ChatMessage> {
    let message = sqlx::query_as::<_, ChatMessage>(
        "INSERT INTO chat_messages (trip_id, role, content) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(role)
    .bind(content)
    .fetch_one(pool)
    .await
    .context("failed to insert chat message")?;

    Ok(message)
}

/// The most recent `limit` turns for a trip, oldest first.
pub async fn list_recent_messages(
    pool: &PgPool,
    trip_id: Uuid,
    limit: i64,
) -> Result<Vec<ChatMessage>> {
    let mut messages = sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM chat_messages \
         WHERE trip_id = $1 \
         ORDER BY id DESC \
         LIMIT $2",
    )
    .bind(trip_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list chat messages")?;

    messages.reverse();
    Ok(messages)
}
