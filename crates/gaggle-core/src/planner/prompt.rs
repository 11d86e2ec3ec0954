//! Prompt construction for generation, revision and location suggestion.
//!
//! Pure string building; no I/O.

use std::fmt::Write as _;

use crate::itinerary::ItineraryItem;
use crate::setup::{MemberKind, TripSetup};

/// Item schema shared by the generation and revision prompts.
const ITEM_SCHEMA: &str = r#"Each itinerary item is a JSON object:
{
  "time": "9:30 AM",                 // display label
  "title": "string",
  "description": "string",
  "category": "activity" | "meal" | "nap" | "travel",
  "link": "https://...",             // optional
  "constraints": ["nap-safe"],       // optional tags you honored
  "travelTime": "15 min",            // optional, travel items
  "travelMode": "walk" | "drive" | "stroller",
  "returnsToBase": true,             // optional, trip ends at the nest
  "isLongDriveNap": true,            // optional, drive doubles as a nap
  "day": 1,                          // 1-based day of the trip
  "mealDetails": {                   // meal items only
    "dietaryFit": { "score": 0-100, "grade": "A", "ratings": { "<restriction>": 0-5 }, "warnings": [] },
    "venue": { "costTier": "$" | "$$" | "$$$" | "$$$$", "waitMinutes": 10,
               "kidFriendly": { "highChairs": true, "kidsMenu": true, "changingTable": false, "playArea": false } }
  }
}"#;

pub const GENERATION_SYSTEM_PROMPT_HEAD: &str = "You are a family trip planner. You build realistic \
day-by-day itineraries for several families traveling together.

Rules:
- Anchor every kid's nap window; schedule naps at the nest when the trip asks for it, otherwise \
use a long drive or stroller walk as a nap.
- Every meal must suit the union of all families' dietary restrictions. Rate each restaurant with \
a dietary fit score.
- Skip activities unsuitable for the youngest traveler's age.
- Keep travel legs short and say how long they take.
- Cover every day of the trip and tag each item with its day number.

Respond with ONLY a JSON array of itinerary items, no prose.";

pub const REVISION_SYSTEM_PROMPT_HEAD: &str = "You help a family edit an existing trip itinerary.

If the user only asks a question, answer in plain text.
If the user asks for a change, respond with ONLY a JSON object:
{\"message\": \"<one sentence describing the change>\", \"itinerary\": [<the COMPLETE updated itinerary>]}
Never return a partial itinerary. Keep items you were not asked to change exactly as they are.";

pub const SUGGESTION_SYSTEM_PROMPT: &str = "You suggest family-friendly travel destinations. \
Respond with ONLY a JSON array of up to 5 strings formatted \"City, Region\".";

pub fn generation_system_prompt() -> String {
    format!("{GENERATION_SYSTEM_PROMPT_HEAD}\n\n{ITEM_SCHEMA}")
}

pub fn revision_system_prompt() -> String {
    format!("{REVISION_SYSTEM_PROMPT_HEAD}\n\n{ITEM_SCHEMA}")
}

/// Describe the trip for the generation call.
pub fn generation_user_prompt(setup: &TripSetup) -> String {
    let days = setup.dates.duration_days();
    let mut out = String::new();

    let _ = writeln!(out, "Destination: {}", setup.location.trim());
    match setup.dates.to {
        Some(to) => {
            let _ = writeln!(out, "Dates: {} to {} ({days} days)", setup.dates.from, to);
        }
        None => {
            let _ = writeln!(out, "Date: {} (1 day)", setup.dates.from);
        }
    }

    out.push_str("\nFamilies:\n");
    for family in &setup.families {
        let _ = write!(out, "- {}", family.name);
        if !family.dietary_restrictions.is_empty() {
            let _ = write!(out, " (diet: {})", family.dietary_restrictions.join(", "));
        }
        out.push('\n');
        for member in &family.members {
            let _ = write!(out, "  - {} ({})", member.name, member.kind);
            if member.kind == MemberKind::Kid {
                if let Some(age) = member.age {
                    let _ = write!(out, ", age {age}");
                }
                if let Some(nap) = member.kid_nap_time() {
                    let _ = write!(out, ", naps {nap}");
                }
            }
            out.push('\n');
        }
    }

    let restrictions = setup.dietary_restrictions();
    if !restrictions.is_empty() {
        let _ = writeln!(out, "\nCombined dietary restrictions: {}", restrictions.join(", "));
    }
    if let Some(age) = setup.youngest_member_age() {
        let _ = writeln!(out, "Youngest traveler: {age} years old");
    }

    if let Some(nest) = &setup.nest {
        let _ = writeln!(out, "\nNest (home base): {}", nest.address);
        if nest.return_for_naps {
            out.push_str("Return to the nest for naps.\n");
        }
    }

    let meals = &setup.meals;
    if !meals.is_empty() {
        out.push_str("\nMeal preferences:\n");
        if !meals.cuisines.is_empty() {
            let _ = writeln!(out, "- cuisines: {}", meals.cuisines.join(", "));
        }
        if let Some(budget) = meals.budget {
            let _ = writeln!(out, "- budget: {budget}");
        }
        if let Some(notes) = &meals.notes {
            let _ = writeln!(out, "- notes: {notes}");
        }
    }

    let _ = write!(out, "\nPlan all {days} day(s).");
    out
}

/// Context block sent ahead of the user's chat message.
pub fn revision_context(location: &str, itinerary: &[ItineraryItem]) -> String {
    let json = serde_json::to_string(itinerary).unwrap_or_else(|_| "[]".to_owned());
    format!("Trip destination: {location}\nCurrent itinerary ({} items):\n{json}", itinerary.len())
}

pub fn suggestion_user_prompt(query: &str) -> String {
    format!("Suggest destinations matching: {}", query.trim())
}
