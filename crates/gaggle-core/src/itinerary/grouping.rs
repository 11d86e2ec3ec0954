//! Day grouping for tabbed display.
//!
//! [`group_by_day`] is a single pass over the flat item list; it never
//! re-sorts and never pads. [`day_tabs`] then lays the groups out over the
//! trip's day range, giving empty tabs for days with no items and an
//! `unscheduled` bucket for anything that cannot be placed on a tab.

use std::collections::BTreeMap;

use serde::Serialize;

use super::day::DayTag;
use super::item::ItineraryItem;

/// An item paired with its position in the original flat list. Completion
/// state is keyed by `original_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedItem {
    #[serde(flatten)]
    pub item: ItineraryItem,
    pub original_index: usize,
}

/// Items bucketed by their day tag. Keys are exactly the tags seen.
pub type DayGroups = BTreeMap<DayTag, Vec<IndexedItem>>;

/// Partition `items` by day, defaulting untagged items to day 1 and keeping
/// the input order within each bucket.
pub fn group_by_day(items: &[ItineraryItem]) -> DayGroups {
    let mut groups = DayGroups::new();
    for (index, item) in items.iter().enumerate() {
        groups
            .entry(DayTag::or_default(item.day.as_ref()))
            .or_default()
            .push(IndexedItem {
                item: item.clone(),
                original_index: index,
            });
    }
    groups
}

/// One rendered day tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTab {
    /// 1-based day number.
    pub day: u32,
    pub items: Vec<IndexedItem>,
}

/// Tabs `1..=days` plus whatever did not fit on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTabs {
    pub tabs: Vec<DayTab>,
    /// Items tagged outside `1..=days` or with a non-numeric tag, in
    /// original order.
    pub unscheduled: Vec<IndexedItem>,
}

impl DayTabs {
    pub fn tab(&self, day: u32) -> Option<&DayTab> {
        day.checked_sub(1).and_then(|i| self.tabs.get(i as usize))
    }
}

/// Lay grouped items out over `days` tabs.
pub fn day_tabs(groups: &DayGroups, days: u32) -> DayTabs {
    let mut tabs: Vec<DayTab> = (1..=days)
        .map(|day| DayTab {
            day,
            items: Vec::new(),
        })
        .collect();
    let mut unscheduled = Vec::new();

    for (tag, items) in groups {
        match tag.in_range(days) {
            Some(day) => tabs[(day - 1) as usize].items.extend(items.iter().cloned()),
            None => unscheduled.extend(items.iter().cloned()),
        }
    }
    unscheduled.sort_by_key(|i| i.original_index);

    DayTabs { tabs, unscheduled }
}
