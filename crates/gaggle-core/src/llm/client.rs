use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM gateway. Each call carries its full context.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider-facing model name, for logs.
    fn model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

// Compile-time assertion: LlmClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn LlmClient) {}
};

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned results in order and records every request.
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: Vec<Result<CompletionResponse, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(texts: &[&str]) -> Self {
            Self::new(
                texts
                    .iter()
                    .map(|t| Ok(CompletionResponse::text(*t)))
                    .collect(),
            )
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::InvalidResponse("no scripted reply".into())))
        }
    }
}
