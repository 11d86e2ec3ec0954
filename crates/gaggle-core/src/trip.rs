//! Trip service layer.
//!
//! Bridges the JSONB rows in `gaggle-db` and the typed domain model: create
//! a trip from a [`TripSetup`], load it back, and drive a chat turn.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::models::{ChatRole, Trip};
use gaggle_db::queries::{chat, trips};

use crate::itinerary::{CompletionSet, DateRange, ItineraryItem};
use crate::llm::Message;
use crate::notice::{Notice, Notices};
use crate::planner::{Planner, RevisionInput};
use crate::setup::{Family, MealPreferences, NestConfig, TripSetup};
use crate::store::TripStore;
use crate::tracker::ItineraryTracker;

/// Chat turns replayed to the planner on each revision.
pub const CHAT_HISTORY_LIMIT: i64 = 20;

/// A trip with its JSONB columns decoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: Uuid,
    pub owner: String,
    pub location: String,
    pub dates: DateRange,
    pub families: Vec<Family>,
    pub nest: Option<NestConfig>,
    pub meals: MealPreferences,
    pub itinerary: Vec<ItineraryItem>,
    pub completed: CompletionSet,
    pub share_code: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Trip> for TripRecord {
    type Error = anyhow::Error;

    fn try_from(row: Trip) -> Result<Self> {
        let families = serde_json::from_value(row.families)
            .with_context(|| format!("trip {}: invalid families", row.id))?;
        let nest = row
            .nest
            .map(serde_json::from_value)
            .transpose()
            .with_context(|| format!("trip {}: invalid nest", row.id))?;
        let meals = row
            .meal_preferences
            .map(serde_json::from_value)
            .transpose()
            .with_context(|| format!("trip {}: invalid meal preferences", row.id))?
            .unwrap_or_default();
        let itinerary = serde_json::from_value(row.itinerary)
            .with_context(|| format!("trip {}: invalid itinerary", row.id))?;

        Ok(Self {
            id: row.id,
            owner: row.owner,
            location: row.location,
            dates: DateRange::new(row.start_date, row.end_date),
            families,
            nest,
            meals,
            itinerary,
            completed: CompletionSet::from_json(&row.progress),
            share_code: row.share_code,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TripRecord {
    /// Hand the itinerary and completion state to a tracker.
    pub fn into_tracker(self, store: Arc<dyn TripStore>) -> ItineraryTracker {
        ItineraryTracker::new(self.id, self.dates, self.itinerary, self.completed, store)
    }
}

/// Save a newly generated trip. The setup is validated again here.
pub async fn create_trip(
    pool: &PgPool,
    owner: &str,
    setup: &TripSetup,
    itinerary: &[ItineraryItem],
) -> Result<TripRecord> {
    setup.validate().context("invalid trip setup")?;
    let families = serde_json::to_value(&setup.families).context("failed to encode families")?;
    let nest = setup
        .nest
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .context("failed to encode nest")?;
    let meals = serde_json::to_value(&setup.meals).context("failed to encode meals")?;
    let items = serde_json::to_value(itinerary).context("failed to encode itinerary")?;

    let row = trips::insert_trip(
        pool,
        &trips::NewTrip {
            owner,
            location: setup.location.trim(),
            start_date: setup.dates.from,
            end_date: setup.dates.to,
            families: &families,
            nest: nest.as_ref(),
            meal_preferences: Some(&meals),
            itinerary: &items,
        },
    )
    .await?;

    tracing::info!(trip_id = %row.id, owner, items = itinerary.len(), "trip created");
    TripRecord::try_from(row)
}

pub async fn load_trip(pool: &PgPool, id: Uuid) -> Result<Option<TripRecord>> {
    trips::get_trip(pool, id)
        .await?
        .map(TripRecord::try_from)
        .transpose()
}

/// Trips `user` owns or collaborates on, newest first.
pub async fn list_trips(pool: &PgPool, user: &str) -> Result<Vec<TripRecord>> {
    trips::list_trips_for_user(pool, user)
        .await?
        .into_iter()
        .map(TripRecord::try_from)
        .collect()
}

/// Result of one chat turn.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    /// Assistant text, absent when the planner call failed.
    pub reply: Option<String>,
    /// Whether the itinerary was replaced.
    pub replaced: bool,
}

/// Send `message` to the planner with the trip's recent history and apply
/// the reply to `tracker`.
///
/// Planner failures become notices and leave everything untouched. The
/// revision is applied before the turn is recorded, so a failed history
/// write only adds a warning. Only the history read can return an error.
pub async fn chat_turn(
    pool: &PgPool,
    planner: &Planner,
    tracker: &mut ItineraryTracker,
    location: &str,
    message: &str,
    notices: &mut Notices,
) -> Result<ChatOutcome> {
    let trip_id = tracker.trip_id();
    let history: Vec<Message> = chat::list_recent_messages(pool, trip_id, CHAT_HISTORY_LIMIT)
        .await?
        .into_iter()
        .map(|m| match m.role {
            ChatRole::User => Message::user(m.content),
            ChatRole::Assistant => Message::assistant(m.content),
        })
        .collect();

    let reply = match planner
        .revise(RevisionInput {
            message,
            itinerary: tracker.itinerary(),
            location,
            history: &history,
        })
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(%trip_id, error = %err, "chat revision failed");
            notices.push(err.notice());
            return Ok(ChatOutcome::default());
        }
    };

    let text = reply.message.clone();
    let replaced = tracker.apply_revision(reply, notices).await;

    if let Err(err) = append_turn(pool, trip_id, message.trim(), &text).await {
        tracing::warn!(%trip_id, error = %format!("{err:#}"), "failed to save chat history");
        notices.push(Notice::warning("Couldn't save this chat message."));
    }

    Ok(ChatOutcome {
        reply: Some(text),
        replaced,
    })
}

async fn append_turn(pool: &PgPool, trip_id: Uuid, user_text: &str, reply: &str) -> Result<()> {
    chat::append_message(pool, trip_id, ChatRole::User, user_text).await?;
    chat::append_message(pool, trip_id, ChatRole::Assistant, reply).await?;
    Ok(())
}
