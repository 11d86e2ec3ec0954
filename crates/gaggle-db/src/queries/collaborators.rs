//! Database query functions for the `collaborators` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Collaborator, CollaboratorRole};

/// Insert a collaborator or update the role of an existing one.
///
/// `accepted` stamps `accepted_at` (used when the collaborator joined by
/// claiming an invite); a re-invite never clears an earlier acceptance.
pub async fn upsert_collaborator(
    pool: &PgPool,
    trip_id: Uuid,
    email: &str,
    role: CollaboratorRole,
    accepted: bool,
) -> Result<Collaborator> {
    let collaborator = sqlx::query_as::<_, Collaborator>(
        "INSERT INTO collaborators (trip_id, email, role, accepted_at) \
         VALUES ($1, $2, $3, CASE WHEN $4 THEN now() END) \
         ON CONFLICT (trip_id, email) DO UPDATE \
         SET role = EXCLUDED.role, \
             accepted_at = COALESCE(collaborators.accepted_at, EXCLUDED.accepted_at) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(email)
    .bind(role)
    .bind(accepted)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert collaborator {email:?}"))?;

    Ok(collaborator)
}

/// List collaborators on a trip, in invitation order.
pub async fn list_collaborators(pool: &PgPool, trip_id: Uuid) -> Result<Vec<Collaborator>> {
    let rows = sqlx::query_as::<_, Collaborator>(
        "SELECT * FROM collaborators WHERE trip_id = $1 ORDER BY invited_at, email",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list collaborators")?;

    Ok(rows)
}

/// Role of `email` on a trip, if they collaborate on it.
pub async fn get_role(
    pool: &PgPool,
    trip_id: Uuid,
    email: &str,
) -> Result<Option<CollaboratorRole>> {
    let role: Option<CollaboratorRole> = sqlx::query_scalar(
        "SELECT role FROM collaborators WHERE trip_id = $1 AND email = $2",
    )
    .bind(trip_id)
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("failed to fetch collaborator role")?;

    Ok(role)
}
