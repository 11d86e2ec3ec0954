//! Database query functions for the `trip_invites` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Collaborator, CollaboratorRole, TripInvite};

/// Insert a new invite code.
pub async fn insert_invite(
    pool: &PgPool,
    code: &str,
    trip_id: Uuid,
    role: CollaboratorRole,
    created_by: &str,
    expires_at: DateTime<Utc>,
) -> Result<TripInvite> {
    let invite = sqlx::query_as::<_, TripInvite>(
        "INSERT INTO trip_invites (code, trip_id, role, created_by, expires_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(code)
    .bind(trip_id)
    .bind(role)
    .bind(created_by)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .context("failed to insert invite")?;

    Ok(invite)
}

/// Fetch an invite by code.
pub async fn get_invite(pool: &PgPool, code: &str) -> Result<Option<TripInvite>> {
    let invite = sqlx::query_as::<_, TripInvite>("SELECT * FROM trip_invites WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("failed to fetch invite")?;

    Ok(invite)
}

/// Atomically claim an unexpired, unclaimed invite for `email` and add them
/// as an accepted collaborator with the invite's role.
///
/// Returns `None` when the code is missing, expired or already claimed; the
/// caller distinguishes these by re-reading the invite.
pub async fn claim_invite(
    pool: &PgPool,
    code: &str,
    email: &str,
) -> Result<Option<(TripInvite, Collaborator)>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let invite = sqlx::query_as::<_, TripInvite>(
        "UPDATE trip_invites \
         SET claimed_by = $2, claimed_at = now() \
         WHERE code = $1 AND claimed_by IS NULL AND expires_at > now() \
         RETURNING *",
    )
    .bind(code)
    .bind(email)
    .fetch_optional(&mut *tx)
    .await
    .context("failed to claim invite")?;

    let Some(invite) = invite else {
        tx.rollback().await.context("failed to roll back claim")?;
        return Ok(None);
    };

    let collaborator = sqlx::query_as::<_, Collaborator>(
        "INSERT INTO collaborators (trip_id, email, role, accepted_at) \
         VALUES ($1, $2, $3, now()) \
         ON CONFLICT (trip_id, email) DO UPDATE \
         SET role = EXCLUDED.role, \
             accepted_at = COALESCE(collaborators.accepted_at, EXCLUDED.accepted_at) \
         RETURNING *",
    )
    .bind(invite.trip_id)
    .bind(email)
    .bind(invite.role)
    .fetch_one(&mut *tx)
    .await
    .context("failed to add collaborator from invite")?;

    tx.commit().await.context("failed to commit invite claim")?;

    Ok(Some((invite, collaborator)))
}
