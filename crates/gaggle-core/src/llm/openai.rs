//! OpenAI-compatible chat-completions client.
//!
//! Works with any gateway that speaks `/v1/chat/completions` (OpenAI,
//! LiteLLM, vLLM, Ollama's compatibility layer).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, GatewayConfig, LlmClient, LlmError, Role, TokenUsage};

const MAX_RETRIES: u32 = 3;
/// Longest `Retry-After` we are willing to sleep through before retrying.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Quota exhaustion arrives as a 429 too, but waiting will not fix it.
fn is_retryable(status: u16, body: &str) -> bool {
    match status {
        408 | 500..=599 => true,
        429 => !body.contains("insufficient_quota"),
        _ => false,
    }
}

pub struct OpenAiCompatClient {
    config: GatewayConfig,
    api_key: String,
    http: Client,
}

impl OpenAiCompatClient {
    pub fn new(config: GatewayConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(GatewayConfig::API_KEY_ENV.to_owned()))?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;
        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content,
            })
        }));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": request.max_tokens.min(self.config.max_tokens),
        });
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        body
    }

    fn classify_failure(status: u16, retry_after: Option<u64>, body: String) -> LlmError {
        match status {
            401 | 403 => LlmError::Unauthorized { status },
            402 => LlmError::QuotaExceeded(body),
            429 if body.contains("insufficient_quota") => LlmError::QuotaExceeded(body),
            429 => LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after.unwrap_or(60)),
            },
            _ => LlmError::Api {
                status,
                message: body,
            },
        }
    }

    fn parse_response(response: ChatResponse) -> Result<CompletionResponse, LlmError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no message content".into()))?;
        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();
        Ok(CompletionResponse { content, usage })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.config.chat_completions_url();
        let body = self.build_request_body(&request);

        let mut last_error = None;
        let mut delay = None;
        for attempt in 0..=MAX_RETRIES {
            if let Some(wait) = delay.take() {
                warn!(attempt, delay = ?wait, "retrying gateway call after transient error");
                tokio::time::sleep(wait).await;
            }
            let backoff = self.config.retry_backoff * 2u32.pow(attempt);

            let response = match self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "gateway network error");
                    last_error = Some(LlmError::Network(e));
                    delay = Some(backoff);
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
                let completion = Self::parse_response(parsed)?;
                debug!(
                    model = %self.config.model,
                    input_tokens = completion.usage.input_tokens,
                    output_tokens = completion.usage.output_tokens,
                    "gateway call succeeded"
                );
                return Ok(completion);
            }

            let code = status.as_u16();
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(status = code, retry_after = ?retry_after, "gateway rate limited request");
            }
            if is_retryable(code, &text) && attempt < MAX_RETRIES {
                debug!(attempt, status = code, "gateway returned retryable status");
                delay = Some(match retry_after {
                    Some(secs) => Duration::from_secs(secs).min(MAX_RETRY_AFTER),
                    None => backoff,
                });
                last_error = Some(Self::classify_failure(code, retry_after, text));
                continue;
            }

            return Err(Self::classify_failure(code, retry_after, text));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("max retries exceeded".into())))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
