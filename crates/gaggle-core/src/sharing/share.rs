//! Public read-only links.

use anyhow::Result as AnyResult;
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::queries::trips;

use super::{SharingError, generate_share_code};
use crate::trip::TripRecord;

const MAX_CODE_ATTEMPTS: usize = 5;

/// Give a trip a share code (reusing an existing one) and set its
/// visibility. Only the owner may share.
pub async fn share_trip(
    pool: &PgPool,
    trip_id: Uuid,
    user: &str,
    is_public: bool,
) -> Result<TripRecord, SharingError> {
    let trip = trips::get_trip(pool, trip_id)
        .await?
        .ok_or(SharingError::TripNotFound(trip_id))?;
    if trip.owner != user {
        return Err(SharingError::NotOwner);
    }

    let code = match trip.share_code {
        Some(code) => code,
        None => unused_share_code(pool).await?,
    };
    let row = trips::set_share_code(pool, trip_id, &code, is_public).await?;
    tracing::info!(%trip_id, share_code = %code, is_public, "trip shared");
    Ok(TripRecord::try_from(row)?)
}

async fn unused_share_code(pool: &PgPool) -> AnyResult<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_share_code();
        if !trips::share_code_exists(pool, &code).await? {
            return Ok(code);
        }
        tracing::debug!(share_code = %code, "share code collision, retrying");
    }
    anyhow::bail!("could not find an unused share code after {MAX_CODE_ATTEMPTS} attempts")
}

/// Look up a public trip by share code. Trips whose share link was turned
/// off are not found.
pub async fn find_shared(pool: &PgPool, code: &str) -> Result<Option<TripRecord>, SharingError> {
    let code = code.trim().to_ascii_uppercase();
    match trips::get_trip_by_share_code(pool, &code).await? {
        Some(row) if row.is_public => Ok(Some(TripRecord::try_from(row)?)),
        _ => Ok(None),
    }
}
