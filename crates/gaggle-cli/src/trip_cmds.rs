//! `gaggle trip`, `toggle`, `chat` and `suggest` commands.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use gaggle_core::itinerary::{Category, DateRange, IndexedItem};
use gaggle_core::llm::{GatewayConfig, OpenAiCompatClient};
use gaggle_core::notice::Notices;
use gaggle_core::planner::Planner;
use gaggle_core::setup::TripSetup;
use gaggle_core::sharing::collaborators;
use gaggle_core::store::PgTripStore;
use gaggle_core::trip::{self, TripRecord};
use gaggle_db::queries::trips as trip_db;

use crate::TripCommands;
use crate::config::GaggleConfig;

pub fn build_planner(gateway: &GatewayConfig) -> Result<Planner> {
    let client = OpenAiCompatClient::new(gateway.clone())?;
    Ok(Planner::new(Arc::new(client)))
}

pub fn parse_trip_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("invalid trip ID: {s}"))
}

pub async fn run_trip_command(
    command: TripCommands,
    pool: &PgPool,
    config: &GaggleConfig,
) -> Result<()> {
    let user = config.require_user()?;
    match command {
        TripCommands::Create { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read trip setup {file}"))?;
            let setup = TripSetup::from_toml(&contents)?;
            let planner = build_planner(&config.gateway)?;

            println!(
                "Planning {} day(s) in {} for {} families...",
                setup.dates.duration_days(),
                setup.location,
                setup.families.len()
            );
            let items = match planner.generate(&setup).await {
                Ok(items) => items,
                Err(err) => bail!("{}", err.notice().message),
            };
            let record = trip::create_trip(pool, user, &setup, &items).await?;
            println!("Created trip {} with {} items.", record.id, record.itinerary.len());
            Ok(())
        }
        TripCommands::List => {
            let trips = trip::list_trips(pool, user).await?;
            if trips.is_empty() {
                println!("No trips yet. Create one with `gaggle trip create <setup.toml>`.");
                return Ok(());
            }
            for t in &trips {
                let progress =
                    gaggle_core::itinerary::compute_progress(&t.completed, t.itinerary.len());
                println!(
                    "{}  {:<28} {}  {:>3.0}%{}",
                    t.id,
                    t.location,
                    format_dates(&t.dates),
                    progress,
                    if t.owner == user { "" } else { "  (shared with you)" }
                );
            }
            Ok(())
        }
        TripCommands::Show { trip_id } => {
            let id = parse_trip_id(&trip_id)?;
            collaborators::require_view(pool, id, user).await?;
            let record = trip::load_trip(pool, id)
                .await?
                .with_context(|| format!("trip {id} not found"))?;
            print!("{}", render_trip(&record));
            Ok(())
        }
        TripCommands::Delete { trip_id } => {
            let id = parse_trip_id(&trip_id)?;
            let record = trip::load_trip(pool, id)
                .await?
                .with_context(|| format!("trip {id} not found"))?;
            if record.owner != user {
                bail!("only the trip owner can delete it");
            }
            trip_db::delete_trip(pool, id).await?;
            println!("Deleted trip {id} ({}).", record.location);
            Ok(())
        }
    }
}

/// Load a trip the user may edit.
async fn load_editable(pool: &PgPool, trip_id: &str, user: &str) -> Result<TripRecord> {
    let id = parse_trip_id(trip_id)?;
    collaborators::require_edit(pool, id, user).await?;
    trip::load_trip(pool, id)
        .await?
        .with_context(|| format!("trip {id} not found"))
}

fn print_notices(notices: &mut Notices) {
    for notice in notices.drain() {
        eprintln!("{notice}");
    }
}

pub async fn run_toggle(
    pool: &PgPool,
    config: &GaggleConfig,
    trip_id: &str,
    index: usize,
) -> Result<()> {
    let user = config.require_user()?;
    let record = load_editable(pool, trip_id, user).await?;
    let Some(item) = record.itinerary.get(index) else {
        bail!(
            "item {index} out of range (trip has {} items)",
            record.itinerary.len()
        );
    };
    let title = item.title.clone();

    let mut tracker = record.into_tracker(Arc::new(PgTripStore::new(pool.clone())));
    let mut notices = Notices::new();
    let done = tracker.toggle(index, &mut notices).await;
    print_notices(&mut notices);

    println!(
        "[{}] {title}  ({:.0}% complete)",
        if done { "x" } else { " " },
        tracker.progress()
    );
    Ok(())
}

pub async fn run_chat(
    pool: &PgPool,
    config: &GaggleConfig,
    trip_id: &str,
    message: &str,
) -> Result<()> {
    let user = config.require_user()?;
    let record = load_editable(pool, trip_id, user).await?;
    let location = record.location.clone();
    let planner = build_planner(&config.gateway)?;

    let mut tracker = record.into_tracker(Arc::new(PgTripStore::new(pool.clone())));
    let mut notices = Notices::new();
    let outcome =
        trip::chat_turn(pool, &planner, &mut tracker, &location, message, &mut notices).await?;
    print_notices(&mut notices);

    if let Some(reply) = outcome.reply {
        println!("{reply}");
    }
    if outcome.replaced {
        println!("(itinerary updated: {} items)", tracker.itinerary().len());
    }
    Ok(())
}

pub async fn run_suggest(config: &GaggleConfig, query: &str) -> Result<()> {
    let planner = build_planner(&config.gateway)?;
    match planner.suggest_locations(query).await {
        Ok(places) if places.is_empty() => println!("No suggestions."),
        Ok(places) => places.iter().for_each(|p| println!("{p}")),
        Err(err) => bail!("{}", err.notice().message),
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

fn format_dates(dates: &DateRange) -> String {
    match dates.to {
        Some(to) if to != dates.from => format!("{} → {}", dates.from, to),
        _ => dates.from.to_string(),
    }
}

fn render_item(out: &mut String, entry: &IndexedItem, done: bool) {
    let item = &entry.item;
    let _ = write!(
        out,
        "  [{}] #{:<3} {:<9} {}",
        if done { "x" } else { " " },
        entry.original_index,
        item.time,
        item.title
    );
    if item.category != Category::Activity {
        let _ = write!(out, " ({})", item.category);
    }
    out.push('\n');

    let travel = &item.travel;
    if let Some(time) = &travel.travel_time {
        let _ = write!(out, "           travel {time}");
        if let Some(mode) = travel.travel_mode {
            let _ = write!(out, " by {mode}");
        }
        if travel.is_long_drive_nap {
            out.push_str(", nap in the car");
        }
        if travel.returns_to_base {
            out.push_str(", back to the nest");
        }
        out.push('\n');
    }
    if let Some(meal) = &item.meal_details {
        let _ = writeln!(out, "           {}", meal.summary());
        for warning in &meal.dietary_fit.warnings {
            let _ = writeln!(out, "           ! {warning}");
        }
    }
}

/// Render a trip as day tabs with completion marks.
pub fn render_trip(record: &TripRecord) -> String {
    let groups = gaggle_core::itinerary::group_by_day(&record.itinerary);
    let days = record.dates.duration_days();
    let tabs = gaggle_core::itinerary::day_tabs(&groups, days);
    let progress =
        gaggle_core::itinerary::compute_progress(&record.completed, record.itinerary.len());

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", record.location, format_dates(&record.dates));
    let _ = writeln!(
        out,
        "Progress: {}/{} ({progress:.0}%)",
        record.completed.len().min(record.itinerary.len()),
        record.itinerary.len()
    );
    if let Some(code) = record.share_code.as_deref().filter(|_| record.is_public) {
        let _ = writeln!(out, "Share code: {code}");
    }

    for tab in &tabs.tabs {
        let date = record
            .dates
            .date_of(tab.day)
            .map(|d| format!(" · {}", d.format("%a %b %-d")))
            .unwrap_or_default();
        let _ = writeln!(out, "\nDay {}{date}", tab.day);
        if tab.items.is_empty() {
            out.push_str("  (nothing planned)\n");
        }
        for entry in &tab.items {
            render_item(&mut out, entry, record.completed.contains(entry.original_index));
        }
    }

    if !tabs.unscheduled.is_empty() {
        out.push_str("\nUnscheduled\n");
        for entry in &tabs.unscheduled {
            render_item(&mut out, entry, record.completed.contains(entry.original_index));
        }
    }
    out
}
