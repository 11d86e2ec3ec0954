//! Persistence boundary for a trip's itinerary and completion state.

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_db::queries::trips;

use crate::itinerary::{CompletionSet, ItineraryItem};

/// Where trip state is written after a local change. `save_progress` and
/// `save_itinerary` overwrite the stored value wholesale; the last write
/// wins.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn save_progress(&self, trip_id: Uuid, completed: &CompletionSet) -> Result<()>;

    /// Persist a single toggle and return the stored set afterwards.
    ///
    /// `completed` is the caller's set with the toggle already applied. The
    /// default writes it whole; stores that can update one element in place
    /// should, and return the merged result.
    async fn save_item(
        &self,
        trip_id: Uuid,
        index: usize,
        done: bool,
        completed: &CompletionSet,
    ) -> Result<CompletionSet> {
        let _ = (index, done);
        self.save_progress(trip_id, completed).await?;
        Ok(completed.clone())
    }

    async fn save_itinerary(&self, trip_id: Uuid, itinerary: &[ItineraryItem]) -> Result<()>;
}

// Compile-time assertion: TripStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TripStore) {}
};

/// [`TripStore`] over the `trips` table.
#[derive(Debug, Clone)]
pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn save_progress(&self, trip_id: Uuid, completed: &CompletionSet) -> Result<()> {
        trips::update_progress(&self.pool, trip_id, &completed.to_json()).await
    }

    async fn save_item(
        &self,
        trip_id: Uuid,
        index: usize,
        done: bool,
        _completed: &CompletionSet,
    ) -> Result<CompletionSet> {
        let index = i32::try_from(index).with_context(|| format!("item index {index} too large"))?;
        let stored = trips::set_item_completed(&self.pool, trip_id, index, done).await?;
        Ok(CompletionSet::from_json(&stored))
    }

    async fn save_itinerary(&self, trip_id: Uuid, itinerary: &[ItineraryItem]) -> Result<()> {
        let value = serde_json::to_value(itinerary).context("failed to encode itinerary")?;
        trips::update_itinerary(&self.pool, trip_id, &value).await
    }
}

/// One write seen by a [`MemoryTripStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Progress(Uuid, CompletionSet),
    Itinerary(Uuid, Vec<ItineraryItem>),
}

/// In-memory [`TripStore`] that records every write. Can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryTripStore {
    writes: Mutex<Vec<StoreWrite>>,
    failing: Mutex<bool>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (and not be recorded).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recently written completion set for `trip_id`.
    pub fn last_progress(&self, trip_id: Uuid) -> Option<CompletionSet> {
        self.writes().into_iter().rev().find_map(|w| match w {
            StoreWrite::Progress(id, set) if id == trip_id => Some(set),
            _ => None,
        })
    }

    fn record(&self, write: StoreWrite) -> Result<()> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            anyhow::bail!("store unavailable");
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(write);
        Ok(())
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn save_progress(&self, trip_id: Uuid, completed: &CompletionSet) -> Result<()> {
        self.record(StoreWrite::Progress(trip_id, completed.clone()))
    }

    async fn save_itinerary(&self, trip_id: Uuid, itinerary: &[ItineraryItem]) -> Result<()> {
        self.record(StoreWrite::Itinerary(trip_id, itinerary.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_records_in_order() {
        let store = MemoryTripStore::new();
        let trip = Uuid::new_v4();
        let set: CompletionSet = [1].into_iter().collect();

        store.save_progress(trip, &set).await.unwrap();
        store.save_itinerary(trip, &[]).await.unwrap();

        assert_eq!(
            store.writes(),
            vec![
                StoreWrite::Progress(trip, set.clone()),
                StoreWrite::Itinerary(trip, vec![]),
            ]
        );
        assert_eq!(store.last_progress(trip), Some(set));
        assert_eq!(store.last_progress(Uuid::new_v4()), None);
    }

    #[tokio::test]
    async fn failing_store_errors_without_recording() {
        let store = MemoryTripStore::new();
        store.set_failing(true);
        assert!(store
            .save_progress(Uuid::new_v4(), &CompletionSet::new())
            .await
            .is_err());
        assert!(store.writes().is_empty());
    }
}
