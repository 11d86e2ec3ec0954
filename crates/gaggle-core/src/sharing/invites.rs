//! Invite links that add a collaborator when claimed.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::models::{Collaborator, CollaboratorRole, TripInvite};
use gaggle_db::queries::{invites, trips};

use super::{SharingError, generate_invite_code};

/// How long an invite link stays claimable.
pub const INVITE_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct InviteLink {
    pub invite: TripInvite,
    pub url: String,
}

pub fn invite_url(public_url: &str, code: &str) -> String {
    format!("{}/invite/{code}", public_url.trim_end_matches('/'))
}

/// Issue an invite for `trip_id`. Only the owner may invite.
pub async fn create_invite(
    pool: &PgPool,
    trip_id: Uuid,
    user: &str,
    role: CollaboratorRole,
    public_url: &str,
) -> Result<InviteLink, SharingError> {
    let trip = trips::get_trip(pool, trip_id)
        .await?
        .ok_or(SharingError::TripNotFound(trip_id))?;
    if trip.owner != user {
        return Err(SharingError::NotOwner);
    }

    let code = generate_invite_code();
    let expires_at = Utc::now() + Duration::days(INVITE_TTL_DAYS);
    let invite = invites::insert_invite(pool, &code, trip_id, role, user, expires_at).await?;
    tracing::info!(%trip_id, %role, %expires_at, "invite created");

    Ok(InviteLink {
        url: invite_url(public_url, &invite.code),
        invite,
    })
}

/// Claim an invite as `user`, becoming an accepted collaborator.
pub async fn claim_invite(
    pool: &PgPool,
    code: &str,
    user: &str,
) -> Result<Collaborator, SharingError> {
    let code = code.trim().to_ascii_lowercase();
    let invite = invites::get_invite(pool, &code)
        .await?
        .ok_or(SharingError::InviteNotFound)?;

    if invite.is_claimed() {
        return Err(SharingError::InviteClaimed);
    }
    if invite.is_expired(Utc::now()) {
        return Err(SharingError::InviteExpired);
    }
    let trip = trips::get_trip(pool, invite.trip_id)
        .await?
        .ok_or(SharingError::TripNotFound(invite.trip_id))?;
    if trip.owner == user {
        return Err(SharingError::OwnInvite);
    }

    // Lost a race with another claimer, or expired in between.
    let Some((invite, collaborator)) = invites::claim_invite(pool, &code, user).await? else {
        return Err(SharingError::InviteClaimed);
    };
    tracing::info!(trip_id = %invite.trip_id, user, role = %invite.role, "invite claimed");
    Ok(collaborator)
}
