//! Itinerary generation and chat revision over an [`LlmClient`].
//!
//! The planner is stateless: each call carries the full trip context, and
//! nothing is persisted here. Callers hand the result to an
//! [`ItineraryTracker`](crate::tracker::ItineraryTracker) or save it
//! themselves.

pub mod parse;
pub mod prompt;

use std::sync::Arc;

pub use parse::RevisionReply;

use crate::error::PlannerError;
use crate::itinerary::ItineraryItem;
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::setup::TripSetup;

const GENERATION_MAX_TOKENS: u32 = 8192;
const REVISION_MAX_TOKENS: u32 = 8192;
const SUGGESTION_MAX_TOKENS: u32 = 512;

/// Most location suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 5;

/// Inputs to a chat revision.
#[derive(Debug, Clone, Copy)]
pub struct RevisionInput<'a> {
    pub message: &'a str,
    pub itinerary: &'a [ItineraryItem],
    pub location: &'a str,
    /// Earlier turns of the conversation, oldest first.
    pub history: &'a [Message],
}

#[derive(Clone)]
pub struct Planner {
    llm: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Build a fresh itinerary for `setup`. The setup is validated first.
    pub async fn generate(&self, setup: &TripSetup) -> Result<Vec<ItineraryItem>, PlannerError> {
        setup.validate()?;

        tracing::info!(
            location = %setup.location,
            days = setup.dates.duration_days(),
            families = setup.families.len(),
            model = self.llm.model(),
            "generating itinerary"
        );

        let request = CompletionRequest {
            system_prompt: prompt::generation_system_prompt(),
            messages: vec![Message::user(prompt::generation_user_prompt(setup))],
            max_tokens: GENERATION_MAX_TOKENS,
            temperature: Some(0.7),
        };
        let response = self.llm.complete(request).await?;
        let items = parse::parse_generation_text(&response.content)?;

        tracing::info!(
            items = items.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "itinerary generated"
        );
        Ok(items)
    }

    /// Answer a chat message, possibly with a full replacement itinerary.
    pub async fn revise(&self, input: RevisionInput<'_>) -> Result<RevisionReply, PlannerError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(PlannerError::Malformed("empty chat message".into()));
        }

        let mut messages = Vec::with_capacity(input.history.len() + 2);
        messages.push(Message::user(prompt::revision_context(
            input.location,
            input.itinerary,
        )));
        messages.push(Message::assistant("Got it. What would you like to change?"));
        messages.extend(input.history.iter().cloned());
        messages.push(Message::user(message));

        let request = CompletionRequest {
            system_prompt: prompt::revision_system_prompt(),
            messages,
            max_tokens: REVISION_MAX_TOKENS,
            temperature: Some(0.4),
        };
        let response = self.llm.complete(request).await?;
        let reply = parse::parse_revision_text(&response.content)?;

        tracing::info!(
            replaced = reply.itinerary.is_some(),
            items = reply.itinerary.as_ref().map_or(0, Vec::len),
            "revision received"
        );
        Ok(reply)
    }

    /// Up to [`MAX_SUGGESTIONS`] destinations matching a partial query.
    pub async fn suggest_locations(&self, query: &str) -> Result<Vec<String>, PlannerError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let request = CompletionRequest {
            system_prompt: prompt::SUGGESTION_SYSTEM_PROMPT.to_owned(),
            messages: vec![Message::user(prompt::suggestion_user_prompt(query))],
            max_tokens: SUGGESTION_MAX_TOKENS,
            temperature: Some(0.2),
        };
        let response = self.llm.complete(request).await?;
        parse::parse_suggestions(&response.content, MAX_SUGGESTIONS)
    }
}
