//! Trip setup: families, nest and meal preferences collected before an
//! itinerary is generated.
//!
//! A setup is read from TOML (see `TripSetup::from_toml`) and validated
//! before any remote call is made.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::itinerary::{CostTier, DateRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Adult,
    Kid,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adult => "adult",
            Self::Kid => "kid",
        })
    }
}

/// A traveler. Age and nap time only mean something for kids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Free-form window such as "1:00-3:00 PM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nap_time: Option<String>,
}

impl Member {
    pub fn adult(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Adult,
            age: None,
            nap_time: None,
        }
    }

    pub fn kid(name: impl Into<String>, age: Option<u32>, nap_time: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Kid,
            age,
            nap_time: nap_time.map(str::to_owned),
        }
    }

    /// Age, for kids only.
    pub fn kid_age(&self) -> Option<u32> {
        match self.kind {
            MemberKind::Kid => self.age,
            MemberKind::Adult => None,
        }
    }

    pub fn kid_nap_time(&self) -> Option<&str> {
        match self.kind {
            MemberKind::Kid => self.nap_time.as_deref(),
            MemberKind::Adult => None,
        }
    }
}

/// A family unit ("gaggle") with its shared dietary restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

/// The trip's home base, anchor for scheduled rest periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestConfig {
    pub address: String,
    /// Schedule naps back at the nest rather than on the go.
    #[serde(default = "default_true")]
    pub return_for_naps: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPreferences {
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<CostTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MealPreferences {
    pub fn is_empty(&self) -> bool {
        self.cuisines.is_empty() && self.budget.is_none() && self.notes.is_none()
    }
}

/// Everything needed to request an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSetup {
    pub location: String,
    pub dates: DateRange,
    #[serde(default, rename = "family")]
    pub families: Vec<Family>,
    #[serde(default)]
    pub nest: Option<NestConfig>,
    #[serde(default)]
    pub meals: MealPreferences,
}

/// Longest trip a setup may describe, in days.
pub const MAX_TRIP_DAYS: u32 = 60;

/// Form-level validation failures, caught before any remote call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("TOML parse error: {0}")]
    Toml(String),

    #[error("a destination is required")]
    MissingLocation,

    #[error("end date {to} is before start date {from}")]
    DatesReversed {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[error("trip is {days} days long; the limit is {max}")]
    TooLong { days: u32, max: u32 },

    #[error("add at least one family")]
    NoFamilies,

    #[error("family #{0} needs a name")]
    UnnamedFamily(usize),
}

impl TripSetup {
    /// Parse and validate a setup file.
    pub fn from_toml(content: &str) -> Result<Self, SetupError> {
        let setup: TripSetup =
            toml::from_str(content).map_err(|e| SetupError::Toml(e.to_string()))?;
        setup.validate()?;
        Ok(setup)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.location.trim().is_empty() {
            return Err(SetupError::MissingLocation);
        }
        if let (true, Some(to)) = (self.dates.is_reversed(), self.dates.to) {
            return Err(SetupError::DatesReversed {
                from: self.dates.from,
                to,
            });
        }
        let days = self.dates.duration_days();
        if days > MAX_TRIP_DAYS {
            return Err(SetupError::TooLong {
                days,
                max: MAX_TRIP_DAYS,
            });
        }
        if self.families.is_empty() {
            return Err(SetupError::NoFamilies);
        }
        if let Some(pos) = self.families.iter().position(|f| f.name.trim().is_empty()) {
            return Err(SetupError::UnnamedFamily(pos + 1));
        }
        Ok(())
    }

    /// Youngest kid's age, used by the planner to filter activities.
    pub fn youngest_member_age(&self) -> Option<u32> {
        self.members().filter_map(Member::kid_age).min()
    }

    /// Union of every family's dietary restrictions, sorted and deduplicated.
    pub fn dietary_restrictions(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .families
            .iter()
            .flat_map(|f| f.dietary_restrictions.iter())
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.families.iter().flat_map(|f| f.members.iter())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const SAMPLE: &str = r#"
location = "Monterey, CA"

[dates]
from = "2026-08-01"
to = "2026-08-03"

[nest]
address = "12 Ocean View Rd"

[meals]
cuisines = ["mexican", "seafood"]
budget = "$$"

[[family]]
name = "Garcia"
dietaryRestrictions = ["Vegetarian", "nut-free"]
members = [
  { name = "Ana", kind = "adult" },
  { name = "Leo", kind = "kid", age = 2, napTime = "1:00-3:00 PM" },
]

[[family]]
name = "Okafor"
dietaryRestrictions = ["vegetarian"]
members = [
  { name = "Chidi", kind = "adult", age = 41 },
  { name = "Ada", kind = "kid", age = 5 },
  { name = "Baby", kind = "kid" },
]
"#;

    #[test]
    fn parses_sample_setup() {
        let setup = TripSetup::from_toml(SAMPLE).unwrap();
        assert_eq!(setup.location, "Monterey, CA");
        assert_eq!(setup.dates.duration_days(), 3);
        assert_eq!(setup.families.len(), 2);
        assert!(setup.nest.as_ref().unwrap().return_for_naps);
        assert_eq!(setup.meals.budget, Some(CostTier::Moderate));
        assert_eq!(
            setup.families[0].members[1].kid_nap_time(),
            Some("1:00-3:00 PM")
        );
    }

    #[test]
    fn youngest_age_ignores_adults_and_unknown_ages() {
        let setup = TripSetup::from_toml(SAMPLE).unwrap();
        assert_eq!(setup.youngest_member_age(), Some(2));
    }

    #[test]
    fn youngest_age_none_without_kids() {
        let mut setup = TripSetup::from_toml(SAMPLE).unwrap();
        for family in &mut setup.families {
            family.members.retain(|m| m.kind == MemberKind::Adult);
        }
        assert_eq!(setup.youngest_member_age(), None);
    }

    #[test]
    fn restrictions_are_unioned() {
        let setup = TripSetup::from_toml(SAMPLE).unwrap();
        assert_eq!(setup.dietary_restrictions(), vec!["nut-free", "vegetarian"]);
    }

    #[test]
    fn rejects_blank_location() {
        let content = SAMPLE.replace("Monterey, CA", "  ");
        assert_eq!(
            TripSetup::from_toml(&content).unwrap_err(),
            SetupError::MissingLocation
        );
    }

    #[test]
    fn rejects_reversed_dates() {
        let content = SAMPLE.replace("to = \"2026-08-03\"", "to = \"2026-07-30\"");
        let err = TripSetup::from_toml(&content).unwrap_err();
        assert_eq!(
            err,
            SetupError::DatesReversed {
                from: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2026, 7, 30).unwrap(),
            }
        );
    }

    #[test]
    fn rejects_overlong_trips() {
        let content = SAMPLE.replace("to = \"2026-08-03\"", "to = \"2126-08-03\"");
        assert!(matches!(
            TripSetup::from_toml(&content).unwrap_err(),
            SetupError::TooLong { max: MAX_TRIP_DAYS, .. }
        ));
    }

    #[test]
    fn sixty_day_trip_is_allowed() {
        // Aug 1 through Sep 29 inclusive.
        let content = SAMPLE.replace("to = \"2026-08-03\"", "to = \"2026-09-29\"");
        let setup = TripSetup::from_toml(&content).unwrap();
        assert_eq!(setup.dates.duration_days(), MAX_TRIP_DAYS);

        let content = SAMPLE.replace("to = \"2026-08-03\"", "to = \"2026-09-30\"");
        assert_eq!(
            TripSetup::from_toml(&content).unwrap_err(),
            SetupError::TooLong { days: 61, max: 60 }
        );
    }

    #[test]
    fn rejects_missing_families() {
        let content = r#"
location = "Reno"
[dates]
from = "2026-08-01"
"#;
        assert_eq!(
            TripSetup::from_toml(content).unwrap_err(),
            SetupError::NoFamilies
        );
    }

    #[test]
    fn family_without_members_is_allowed() {
        let content = r#"
location = "Reno"
[dates]
from = "2026-08-01"
[[family]]
name = "Solo"
"#;
        let setup = TripSetup::from_toml(content).unwrap();
        assert_eq!(setup.dates.duration_days(), 1);
        assert!(setup.families[0].members.is_empty());
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(
            TripSetup::from_toml("location = "),
            Err(SetupError::Toml(_))
        ));
    }
}
