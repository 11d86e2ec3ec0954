//! Flock connections: mutual friend links between users.

use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::models::{FlockConnection, FlockStatus};
use gaggle_db::queries::flock;

use super::SharingError;
use super::collaborators::normalize_email;

/// Ask `addressee` to join `requester`'s flock.
pub async fn request(
    pool: &PgPool,
    requester: &str,
    addressee: &str,
) -> Result<FlockConnection, SharingError> {
    let addressee = normalize_email(addressee)?;
    if addressee == requester {
        return Err(SharingError::SelfRequest);
    }
    if flock::find_between(pool, requester, &addressee).await?.is_some() {
        return Err(SharingError::DuplicateRequest);
    }

    let conn = flock::insert_request(pool, requester, &addressee).await?;
    tracing::info!(id = %conn.id, requester, addressee = %conn.addressee, "flock request sent");
    Ok(conn)
}

/// Accept or decline a pending request addressed to `user`.
pub async fn respond(
    pool: &PgPool,
    id: Uuid,
    user: &str,
    accept: bool,
) -> Result<FlockConnection, SharingError> {
    let conn = flock::get_connection(pool, id)
        .await?
        .ok_or(SharingError::RequestNotFound)?;
    if conn.addressee != user {
        return Err(SharingError::NotAddressee);
    }

    let status = if accept {
        FlockStatus::Accepted
    } else {
        FlockStatus::Declined
    };
    let conn = flock::respond(pool, id, status)
        .await?
        .ok_or(SharingError::AlreadyAnswered)?;
    tracing::info!(%id, %status, "flock request answered");
    Ok(conn)
}

pub async fn list(pool: &PgPool, user: &str) -> Result<Vec<FlockConnection>, SharingError> {
    Ok(flock::list_for_user(pool, user).await?)
}
