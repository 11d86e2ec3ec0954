use std::time::Duration;

use thiserror::Error;

/// Failures talking to the LLM gateway.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("gateway rejected credentials ({status})")]
    Unauthorized { status: u16 },

    #[error("usage quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("gateway error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

impl LlmError {
    /// Whether a retry of the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            Self::Unauthorized { .. }
            | Self::QuotaExceeded(_)
            | Self::InvalidResponse(_)
            | Self::MissingApiKey(_) => false,
        }
    }

    /// Short message suitable for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => {
                "The planner is busy right now. Please try again in a minute.".to_owned()
            }
            Self::Unauthorized { .. } | Self::MissingApiKey(_) => {
                "The planner could not authenticate. Check the gateway API key.".to_owned()
            }
            Self::QuotaExceeded(_) => "Planner usage limit reached.".to_owned(),
            Self::Network(_) => "Could not reach the planner. Check your connection.".to_owned(),
            Self::Api { .. } | Self::InvalidResponse(_) => {
                "The planner hit an error. Please try again.".to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(
            LlmError::RateLimited {
                retry_after: Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(
            LlmError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !LlmError::Api {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!LlmError::Unauthorized { status: 401 }.is_transient());
        assert!(!LlmError::QuotaExceeded("monthly".into()).is_transient());
    }

    #[test]
    fn user_messages_hide_details() {
        let err = LlmError::Api {
            status: 500,
            message: "stack trace here".into(),
        };
        assert!(!err.user_message().contains("stack trace"));
    }
}
