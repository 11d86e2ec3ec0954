//! Database query functions for the `flock_connections` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{FlockConnection, FlockStatus};

/// Insert a pending connection request.
pub async fn insert_request(
    pool: &PgPool,
    requester: &str,
    addressee: &str,
) -> Result<FlockConnection> {
    let conn = sqlx::query_as::<_, FlockConnection>(
        "INSERT INTO flock_connections (requester, addressee) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(requester)
    .bind(addressee)
    .fetch_one(pool)
    .await
    .context("failed to insert flock request")?;

    Ok(conn)
}

pub async fn get_connection(pool: &PgPool, id: Uuid) -> Result<Option<FlockConnection>> {
    let conn = sqlx::query_as::<_, FlockConnection>("SELECT * FROM flock_connections WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch flock connection")?;

    Ok(conn)
}

/// Find a connection between two users in either direction.
pub async fn find_between(pool: &PgPool, a: &str, b: &str) -> Result<Option<FlockConnection>> {
    let conn = sqlx::query_as::<_, FlockConnection>(
        "SELECT * FROM flock_connections \
         WHERE (requester = $1 AND addressee = $2) \
            OR (requester = $2 AND addressee = $1) \
         LIMIT 1",
    )
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
    .context("failed to look up flock connection")?;

    Ok(conn)
}

/// Record the addressee's answer. Only pending requests can be answered;
/// returns `None` when the row is missing or already answered.
pub async fn respond(
    pool: &PgPool,
    id: Uuid,
    status: FlockStatus,
) -> Result<Option<FlockConnection>> {
    let conn = sqlx::query_as::<_, FlockConnection>(
        "UPDATE flock_connections \
         SET status = $1, responded_at = now() \
         WHERE id = $2 AND status = 'pending' \
         RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to respond to flock request")?;

    Ok(conn)
}

/// All connections touching `user`, newest first.
pub async fn list_for_user(pool: &PgPool, user: &str) -> Result<Vec<FlockConnection>> {
    let conns = sqlx::query_as::<_, FlockConnection>(
        "SELECT * FROM flock_connections \
         WHERE requester = $1 OR addressee = $1 \
         ORDER BY created_at DESC",
    )
    .bind(user)
    .fetch_all(pool)
    .await
    .context("failed to list flock connections")?;

    Ok(conns)
}
