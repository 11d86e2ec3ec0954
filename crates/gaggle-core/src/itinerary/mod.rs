//! Itinerary model, day grouping and completion tracking.
//!
//! Everything here is pure data transformation with no I/O.

pub mod dates;
pub mod day;
pub mod grouping;
pub mod item;
pub mod progress;

pub use dates::DateRange;
pub use day::DayTag;
pub use grouping::{DayGroups, DayTab, DayTabs, IndexedItem, day_tabs, group_by_day};
pub use item::{
    Category, CostTier, DietaryFit, ItineraryItem, KidFacilities, MealDetail, TravelInfo,
    TravelMode, Venue,
};
pub use progress::{CompletionSet, compute_progress};
