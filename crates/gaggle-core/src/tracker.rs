//! Local trip state with write-through persistence.
//!
//! The tracker applies every change locally first and then writes it to its
//! [`TripStore`]. A failed write leaves the local state as it is and pushes a
//! warning notice; nothing is rolled back.

use std::sync::Arc;

use uuid::Uuid;

use crate::itinerary::{
    CompletionSet, DateRange, DayGroups, DayTabs, ItineraryItem, compute_progress, day_tabs,
    group_by_day,
};
use crate::notice::{Notice, Notices};
use crate::planner::RevisionReply;
use crate::store::TripStore;

pub struct ItineraryTracker {
    trip_id: Uuid,
    dates: DateRange,
    itinerary: Vec<ItineraryItem>,
    completed: CompletionSet,
    store: Arc<dyn TripStore>,
}

impl ItineraryTracker {
    pub fn new(
        trip_id: Uuid,
        dates: DateRange,
        itinerary: Vec<ItineraryItem>,
        completed: CompletionSet,
        store: Arc<dyn TripStore>,
    ) -> Self {
        Self {
            trip_id,
            dates,
            itinerary,
            completed,
            store,
        }
    }

    pub fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    pub fn itinerary(&self) -> &[ItineraryItem] {
        &self.itinerary
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    pub fn duration_days(&self) -> u32 {
        self.dates.duration_days()
    }

    pub fn groups(&self) -> DayGroups {
        group_by_day(&self.itinerary)
    }

    pub fn tabs(&self) -> DayTabs {
        day_tabs(&self.groups(), self.duration_days())
    }

    /// Percent of items checked off.
    pub fn progress(&self) -> f64 {
        compute_progress(&self.completed, self.itinerary.len())
    }

    /// Flip the completion of item `index` locally, then persist it.
    ///
    /// On success the local set is replaced by what the store holds, which
    /// picks up toggles other clients made meanwhile. Returns whether the
    /// item is now completed.
    pub async fn toggle(&mut self, index: usize, notices: &mut Notices) -> bool {
        self.completed = self.completed.toggle(index);
        let done = self.completed.contains(index);
        tracing::debug!(trip_id = %self.trip_id, index, done, "toggled item");

        match self
            .store
            .save_item(self.trip_id, index, done, &self.completed)
            .await
        {
            Ok(stored) => self.completed = stored,
            Err(err) => {
                tracing::warn!(trip_id = %self.trip_id, error = %err, "failed to save progress");
                notices.push(Notice::warning(
                    "Couldn't save your progress. It will be lost if you leave this trip.",
                ));
            }
        }
        done
    }

    /// Overwrite the itinerary wholesale and persist it. The completion set
    /// is left as is.
    pub async fn replace_itinerary(&mut self, items: Vec<ItineraryItem>, notices: &mut Notices) {
        tracing::info!(
            trip_id = %self.trip_id,
            old = self.itinerary.len(),
            new = items.len(),
            "replacing itinerary"
        );
        self.itinerary = items;

        if let Err(err) = self.store.save_itinerary(self.trip_id, &self.itinerary).await {
            tracing::warn!(trip_id = %self.trip_id, error = %err, "failed to save itinerary");
            notices.push(Notice::warning(
                "Couldn't save the updated itinerary. It will be lost if you leave this trip.",
            ));
        }
    }

    /// Apply a chat reply. Only a reply carrying an itinerary changes
    /// anything; returns whether it did.
    pub async fn apply_revision(&mut self, reply: RevisionReply, notices: &mut Notices) -> bool {
        match reply.itinerary {
            Some(items) => {
                self.replace_itinerary(items, notices).await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::itinerary::{Category, DayTag};
    use crate::store::{MemoryTripStore, StoreWrite};

    fn items(days: i64, per_day: usize) -> Vec<ItineraryItem> {
        (1..=days)
            .flat_map(|day| {
                (0..per_day).map(move |n| {
                    ItineraryItem::new(format!("{}:00", 9 + n), format!("d{day}-{n}"), Category::Activity)
                        .on_day(day)
                })
            })
            .collect()
    }

    fn three_days() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 7, 10).unwrap(),
            Some(NaiveDate::from_ymd_opt(2026, 7, 12).unwrap()),
        )
    }

    fn tracker(store: &Arc<MemoryTripStore>, itinerary: Vec<ItineraryItem>) -> ItineraryTracker {
        ItineraryTracker::new(
            Uuid::new_v4(),
            three_days(),
            itinerary,
            CompletionSet::new(),
            Arc::clone(store) as Arc<dyn TripStore>,
        )
    }

    #[test]
    fn three_days_of_four_items() {
        let store = Arc::new(MemoryTripStore::new());
        let t = tracker(&store, items(3, 4));

        let groups = t.groups();
        assert_eq!(groups.len(), 3);
        for day in 1..=3 {
            let bucket = &groups[&DayTag::Number(day)];
            assert_eq!(bucket.len(), 4);
            let first = ((day - 1) * 4) as usize;
            let indices: Vec<usize> = bucket.iter().map(|i| i.original_index).collect();
            assert_eq!(indices, (first..first + 4).collect::<Vec<_>>());
        }

        assert_eq!(t.duration_days(), 3);
        assert_eq!(t.tabs().tabs.len(), 3);
        assert_eq!(t.progress(), 0.0);
    }

    #[tokio::test]
    async fn double_toggle_writes_twice_and_restores() {
        let store = Arc::new(MemoryTripStore::new());
        let mut t = tracker(&store, items(3, 4));
        let original = t.completed().clone();
        let mut notices = Notices::new();

        assert!(t.toggle(5, &mut notices).await);
        assert!(!t.toggle(5, &mut notices).await);

        let writes = store.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[0],
            StoreWrite::Progress(t.trip_id(), [5].into_iter().collect())
        );
        assert_eq!(store.last_progress(t.trip_id()), Some(original.clone()));
        assert_eq!(t.completed(), &original);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn toggle_updates_progress() {
        let store = Arc::new(MemoryTripStore::new());
        let mut t = tracker(&store, items(1, 4));
        let mut notices = Notices::new();
        t.toggle(0, &mut notices).await;
        assert_eq!(t.progress(), 25.0);
    }

    #[tokio::test]
    async fn failed_progress_write_keeps_local_state() {
        let store = Arc::new(MemoryTripStore::new());
        store.set_failing(true);
        let mut t = tracker(&store, items(1, 2));
        let mut notices = Notices::new();

        assert!(t.toggle(1, &mut notices).await);
        assert!(t.completed().contains(1));
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices.iter().next().unwrap().level,
            crate::notice::NoticeLevel::Warning
        );
    }

    #[tokio::test]
    async fn reply_without_itinerary_changes_nothing() {
        let store = Arc::new(MemoryTripStore::new());
        let before = items(3, 4);
        let mut t = tracker(&store, before.clone());
        let mut notices = Notices::new();
        t.toggle(2, &mut notices).await;
        let completed_before = t.completed().clone();

        let changed = t
            .apply_revision(
                RevisionReply {
                    message: "The zoo opens at 9.".into(),
                    itinerary: None,
                },
                &mut notices,
            )
            .await;

        assert!(!changed);
        assert_eq!(t.itinerary(), before.as_slice());
        assert_eq!(t.completed(), &completed_before);
        assert_eq!(store.writes().len(), 1, "only the toggle was written");
    }

    #[tokio::test]
    async fn replacement_overwrites_and_keeps_completion() {
        let store = Arc::new(MemoryTripStore::new());
        let mut t = tracker(&store, items(3, 4));
        let mut notices = Notices::new();
        t.toggle(7, &mut notices).await;

        let replacement = items(1, 2);
        let changed = t
            .apply_revision(
                RevisionReply {
                    message: "Trimmed it down.".into(),
                    itinerary: Some(replacement.clone()),
                },
                &mut notices,
            )
            .await;

        assert!(changed);
        assert_eq!(t.itinerary(), replacement.as_slice());
        assert!(t.completed().contains(7));
        assert_eq!(t.progress(), 50.0);
        assert_eq!(
            store.writes().last(),
            Some(&StoreWrite::Itinerary(t.trip_id(), replacement))
        );
    }

    #[tokio::test]
    async fn failed_itinerary_write_keeps_replacement() {
        let store = Arc::new(MemoryTripStore::new());
        let mut t = tracker(&store, items(1, 1));
        store.set_failing(true);
        let mut notices = Notices::new();

        t.replace_itinerary(items(2, 2), &mut notices).await;
        assert_eq!(t.itinerary().len(), 4);
        assert_eq!(notices.len(), 1);
    }
}
