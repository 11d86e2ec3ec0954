//! Direct collaborator invitations and access checks.

use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::models::{Collaborator, CollaboratorRole};
use gaggle_db::queries::{collaborators, trips};

use super::SharingError;

/// What a user may do with a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Collaborator(CollaboratorRole),
}

impl Access {
    pub fn can_edit(self) -> bool {
        match self {
            Self::Owner => true,
            Self::Collaborator(role) => role.can_edit(),
        }
    }
}

/// Loose shape check: one `@` with something on both sides and a dot in
/// the domain.
pub fn normalize_email(email: &str) -> Result<String, SharingError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(SharingError::InvalidEmail(email)),
    }
}

/// Resolve `user`'s access to a trip. `None` means no access.
pub async fn access_for(
    pool: &PgPool,
    trip_id: Uuid,
    user: &str,
) -> Result<Option<Access>, SharingError> {
    let trip = trips::get_trip(pool, trip_id)
        .await?
        .ok_or(SharingError::TripNotFound(trip_id))?;
    if trip.owner == user {
        return Ok(Some(Access::Owner));
    }
    Ok(collaborators::get_role(pool, trip_id, user)
        .await?
        .map(Access::Collaborator))
}

/// Like [`access_for`] but fails with [`SharingError::Forbidden`] unless
/// the user may edit.
pub async fn require_edit(pool: &PgPool, trip_id: Uuid, user: &str) -> Result<Access, SharingError> {
    match access_for(pool, trip_id, user).await? {
        Some(access) if access.can_edit() => Ok(access),
        _ => Err(SharingError::Forbidden),
    }
}

/// Fails with [`SharingError::Forbidden`] unless the user can see the trip.
pub async fn require_view(pool: &PgPool, trip_id: Uuid, user: &str) -> Result<Access, SharingError> {
    access_for(pool, trip_id, user)
        .await?
        .ok_or(SharingError::Forbidden)
}

/// Invite `email` to a trip by address. Re-inviting changes the role.
pub async fn add_collaborator(
    pool: &PgPool,
    trip_id: Uuid,
    user: &str,
    email: &str,
    role: CollaboratorRole,
) -> Result<Collaborator, SharingError> {
    let trip = trips::get_trip(pool, trip_id)
        .await?
        .ok_or(SharingError::TripNotFound(trip_id))?;
    if trip.owner != user {
        return Err(SharingError::NotOwner);
    }
    let email = normalize_email(email)?;
    if email == trip.owner {
        return Err(SharingError::OwnInvite);
    }

    let collaborator =
        collaborators::upsert_collaborator(pool, trip_id, &email, role, false).await?;
    tracing::info!(%trip_id, email = %collaborator.email, %role, "collaborator invited");
    Ok(collaborator)
}

pub async fn list_collaborators(
    pool: &PgPool,
    trip_id: Uuid,
    user: &str,
) -> Result<Vec<Collaborator>, SharingError> {
    require_view(pool, trip_id, user).await?;
    Ok(collaborators::list_collaborators(pool, trip_id).await?)
}
