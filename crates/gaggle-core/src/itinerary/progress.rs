use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Indices into a trip's itinerary that the user has checked off.
///
/// Stored as `{"completed": [..]}`. Older blobs used `completedIndices`,
/// which is still accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSet {
    #[serde(default, alias = "completedIndices")]
    completed: BTreeSet<usize>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `index` and return the resulting set.
    ///
    /// The caller persists the returned set. Toggling the same index twice
    /// gives back the original set.
    #[must_use]
    pub fn toggle(&self, index: usize) -> Self {
        let mut next = self.clone();
        if !next.completed.remove(&index) {
            next.completed.insert(index);
        }
        next
    }

    pub fn contains(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Completed indices, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.completed.iter().copied()
    }

    /// Decode a stored progress blob. Unreadable blobs count as empty.
    pub fn from_json(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "unreadable progress blob, treating as empty");
            Self::default()
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "completed": self.completed })
    }
}

impl FromIterator<usize> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            completed: iter.into_iter().collect(),
        }
    }
}

/// Percentage of items completed, `0.0` for an empty itinerary.
///
/// Indices left over from a replaced itinerary can outnumber the items, so
/// the result is capped at 100.
pub fn compute_progress(completed: &CompletionSet, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * completed.len() as f64 / total as f64).min(100.0)
}
