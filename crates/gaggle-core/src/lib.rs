//! Core logic for gaggle: itinerary grouping and progress, trip setup, the
//! LLM planner, write-through trip state and sharing.

pub mod busy;
pub mod error;
pub mod itinerary;
pub mod llm;
pub mod notice;
pub mod planner;
pub mod setup;
pub mod sharing;
pub mod store;
pub mod tracker;
pub mod trip;
