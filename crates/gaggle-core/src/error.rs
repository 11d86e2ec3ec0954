//! Error taxonomy for planner operations.

use thiserror::Error;

use crate::llm::LlmError;
use crate::notice::Notice;
use crate::setup::SetupError;

/// Failures of a generation, revision or suggestion call.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Caught before any remote call is made.
    #[error("invalid trip setup: {0}")]
    Validation(#[from] SetupError),

    #[error(transparent)]
    Remote(#[from] LlmError),

    /// The model answered, but not in the shape we asked for.
    #[error("malformed planner response: {0}")]
    Malformed(String),
}

impl PlannerError {
    /// The toast shown to the user for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(err) => Notice::warning(err.to_string()),
            Self::Remote(err) => Notice::error(err.user_message()),
            Self::Malformed(_) => {
                Notice::error("The planner sent back something we couldn't read. Please try again.")
            }
        }
    }
}
