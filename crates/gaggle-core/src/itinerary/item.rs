//! Itinerary item types as produced by the generation and revision calls.
//!
//! The wire format is camelCase JSON. Items are immutable once received:
//! they change only by wholesale replacement of the whole list.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::day::DayTag;

/// What kind of slot an item occupies in the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Activity,
    Meal,
    Nap,
    Travel,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Activity => "activity",
            Self::Meal => "meal",
            Self::Nap => "nap",
            Self::Travel => "travel",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walk,
    Drive,
    Stroller,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Walk => "walk",
            Self::Drive => "drive",
            Self::Stroller => "stroller",
        })
    }
}

/// Travel metadata. Flattened into the item on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInfo {
    /// Human-readable duration, e.g. "15 min".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_mode: Option<TravelMode>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub returns_to_base: bool,
    /// A long drive scheduled so a kid naps in the car.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_long_drive_nap: bool,
}

impl TravelInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Restaurant cost bracket, `$` through `$$$$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostTier {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Splurge,
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Budget => "$",
            Self::Moderate => "$$",
            Self::Upscale => "$$$",
            Self::Splurge => "$$$$",
        })
    }
}

/// How well a restaurant fits every traveling family's restrictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryFit {
    /// 0-100.
    pub score: u8,
    /// Letter grade, e.g. "A-".
    #[serde(default)]
    pub grade: String,
    /// Restriction tag -> stars (0-5).
    #[serde(default)]
    pub ratings: BTreeMap<String, u8>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KidFacilities {
    #[serde(default)]
    pub high_chairs: bool,
    #[serde(default)]
    pub kids_menu: bool,
    #[serde(default)]
    pub changing_table: bool,
    #[serde(default)]
    pub play_area: bool,
}

impl KidFacilities {
    /// Labels of the facilities present, in a fixed order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.high_chairs, "high chairs"),
            (self.kids_menu, "kids menu"),
            (self.changing_table, "changing table"),
            (self.play_area, "play area"),
        ]
        .into_iter()
        .filter_map(|(present, label)| present.then_some(label))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_tier: Option<CostTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_minutes: Option<u32>,
    #[serde(default)]
    pub kid_friendly: KidFacilities,
}

/// Structured detail attached to meal items. Rendered, never recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDetail {
    pub dietary_fit: DietaryFit,
    #[serde(default)]
    pub venue: Venue,
}

impl MealDetail {
    /// One-line rendering, e.g. `fit 92 (A-) · $$ · ~15 min wait · kids menu`.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "fit {} ({})",
            self.dietary_fit.score.min(100),
            if self.dietary_fit.grade.is_empty() {
                "?"
            } else {
                &self.dietary_fit.grade
            }
        )];
        if let Some(tier) = self.venue.cost_tier {
            parts.push(tier.to_string());
        }
        if let Some(wait) = self.venue.wait_minutes {
            parts.push(format!("~{wait} min wait"));
        }
        parts.extend(
            self.venue
                .kid_friendly
                .labels()
                .into_iter()
                .map(str::to_owned),
        );
        parts.join(" · ")
    }
}

/// One scheduled entry in a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryItem {
    /// Display label such as "9:30 AM".
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Constraint tags the planner honored (e.g. "nap-safe", "vegan").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(flatten)]
    pub travel: TravelInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<DayTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_details: Option<MealDetail>,
}

impl ItineraryItem {
    /// A minimal item; used by tests and by callers building items by hand.
    pub fn new(time: impl Into<String>, title: impl Into<String>, category: Category) -> Self {
        Self {
            time: time.into(),
            title: title.into(),
            description: String::new(),
            category,
            link: None,
            constraints: Vec::new(),
            travel: TravelInfo::default(),
            day: None,
            meal_details: None,
        }
    }

    pub fn on_day(mut self, day: i64) -> Self {
        self.day = Some(DayTag::Number(day));
        self
    }
}
