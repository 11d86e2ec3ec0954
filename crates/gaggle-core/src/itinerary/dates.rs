use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// The user-selected trip dates. A missing `to` means a single-day trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn single_day(from: NaiveDate) -> Self {
        Self { from, to: None }
    }

    /// Number of day tabs to render: inclusive day count, never below 1.
    ///
    /// This is the tab count whether or not any item is tagged with each day.
    pub fn duration_days(&self) -> u32 {
        let Some(to) = self.to else {
            return 1;
        };
        let span = (to - self.from).num_days() + 1;
        u32::try_from(span.max(1)).unwrap_or(u32::MAX)
    }

    /// Calendar date of a 1-based day number.
    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        let offset = day.checked_sub(1)?;
        self.from.checked_add_days(Days::new(u64::from(offset)))
    }

    /// Whether the end date precedes the start date.
    pub fn is_reversed(&self) -> bool {
        self.to.is_some_and(|to| to < self.from)
    }
}
