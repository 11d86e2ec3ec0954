//! Database query functions for the `trips` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Trip;

/// Column values for a new trip row.
#[derive(Debug, Clone)]
pub struct NewTrip<'a> {
    pub owner: &'a str,
    pub location: &'a str,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub families: &'a Value,
    pub nest: Option<&'a Value>,
    pub meal_preferences: Option<&'a Value>,
    pub itinerary: &'a Value,
}

/// Insert a new trip. Progress starts empty.
pub async fn insert_trip(pool: &PgPool, trip: &NewTrip<'_>) -> Result<Trip> {
    let row = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (owner, location, start_date, end_date, families, nest, meal_preferences, itinerary) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(trip.owner)
    .bind(trip.location)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(trip.families)
    .bind(trip.nest)
    .bind(trip.meal_preferences)
    .bind(trip.itinerary)
    .fetch_one(pool)
    .await
    .context("failed to insert trip")?;

    Ok(row)
}

/// Fetch a trip by its ID.
pub async fn get_trip(pool: &PgPool, id: Uuid) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip")?;

    Ok(trip)
}

/// List trips a user owns or collaborates on, newest first.
pub async fn list_trips_for_user(pool: &PgPool, user: &str) -> Result<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(
        "SELECT t.* FROM trips t \
         WHERE t.owner = $1 \
            OR EXISTS ( \
                SELECT 1 FROM collaborators c \
                WHERE c.trip_id = t.id AND c.email = $1 \
            ) \
         ORDER BY t.created_at DESC",
    )
    .bind(user)
    .fetch_all(pool)
    .await
    .context("failed to list trips for user")?;

    Ok(trips)
}

/// Overwrite the stored completion blob. Last write wins.
pub async fn update_progress(pool: &PgPool, id: Uuid, progress: &Value) -> Result<()> {
    let result = sqlx::query("UPDATE trips SET progress = $1, updated_at = now() WHERE id = $2")
        .bind(progress)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update trip progress")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("trip {id} not found");
    }

    Ok(())
}

/// Add or remove one index in the stored completion set in a single
/// statement, so concurrent toggles of different items both land.
///
/// Rewrites the blob to the canonical `{"completed": [..]}` shape (reading
/// the legacy `completedIndices` key if that is all there is) and returns
/// it.
pub async fn set_item_completed(pool: &PgPool, id: Uuid, index: i32, done: bool) -> Result<Value> {
    let progress: Option<Value> = sqlx::query_scalar(
        "UPDATE trips SET progress = jsonb_build_object('completed', COALESCE(( \
             SELECT jsonb_agg(s.i ORDER BY s.i) FROM ( \
                 SELECT e.value::int AS i \
                 FROM jsonb_array_elements_text(COALESCE( \
                     progress->'completed', progress->'completedIndices', '[]'::jsonb \
                 )) AS e(value) \
                 WHERE e.value::int <> $2 \
                 UNION \
                 SELECT $2::int WHERE $3::boolean \
             ) AS s \
         ), '[]'::jsonb)), updated_at = now() \
         WHERE id = $1 \
         RETURNING progress",
    )
    .bind(id)
    .bind(index)
    .bind(done)
    .fetch_optional(pool)
    .await
    .context("failed to update item completion")?;

    progress.with_context(|| format!("trip {id} not found"))
}

/// Overwrite the stored itinerary array wholesale. Last write wins.
pub async fn update_itinerary(pool: &PgPool, id: Uuid, itinerary: &Value) -> Result<()> {
    let result = sqlx::query("UPDATE trips SET itinerary = $1, updated_at = now() WHERE id = $2")
        .bind(itinerary)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update trip itinerary")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("trip {id} not found");
    }

    Ok(())
}

/// Store a share code and visibility flag on a trip.
pub async fn set_share_code(
    pool: &PgPool,
    id: Uuid,
    share_code: &str,
    is_public: bool,
) -> Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "UPDATE trips SET share_code = $1, is_public = $2, updated_at = now() \
         WHERE id = $3 \
         RETURNING *",
    )
    .bind(share_code)
    .bind(is_public)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to set share code")?;

    trip.with_context(|| format!("trip {id} not found"))
}

/// Look a trip up by its share code.
pub async fn get_trip_by_share_code(pool: &PgPool, share_code: &str) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE share_code = $1")
        .bind(share_code)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip by share code")?;

    Ok(trip)
}

/// Check whether a share code is already taken.
pub async fn share_code_exists(pool: &PgPool, share_code: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trips WHERE share_code = $1)")
            .bind(share_code)
            .fetch_one(pool)
            .await
            .context("failed to check share code")?;

    Ok(exists)
}

/// Delete a trip and (by cascade) its chat, collaborators and invites.
/// Returns `false` if the trip did not exist.
pub async fn delete_trip(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete trip")?;

    Ok(result.rows_affected() > 0)
}
