//! Per-trip busy flag.
//!
//! A chat submission marks its trip busy until the reply has been handled;
//! a second submission for the same trip is refused rather than queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct BusySet {
    inner: Arc<Mutex<HashSet<Uuid>>>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `trip_id` busy. Returns `None` if it already is.
    pub fn try_begin(&self, trip_id: Uuid) -> Option<BusyGuard> {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(trip_id) {
            tracing::debug!(%trip_id, "trip already busy");
            return None;
        }
        Some(BusyGuard {
            set: Arc::clone(&self.inner),
            trip_id,
        })
    }
}

/// Clears the trip's busy flag on drop.
#[derive(Debug)]
pub struct BusyGuard {
    set: Arc<Mutex<HashSet<Uuid>>>,
    trip_id: Uuid,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.trip_id);
    }
}
