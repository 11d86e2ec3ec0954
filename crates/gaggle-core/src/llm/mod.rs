//! LLM gateway client.
//!
//! Itinerary generation and chat revision are delegated to a hosted model;
//! this module is the typed boundary to it.

mod client;
mod config;
mod error;
mod openai;
mod types;

#[cfg(test)]
pub use client::mock;
pub use client::LlmClient;
pub use config::GatewayConfig;
pub use error::LlmError;
pub use openai::OpenAiCompatClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};
