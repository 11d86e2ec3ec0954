use std::time::Duration;

/// Where and how to reach the OpenAI-compatible gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL without the `/v1/...` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Ceiling applied to every request's `max_tokens`.
    pub max_tokens: u32,
    /// First retry delay; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl GatewayConfig {
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const API_KEY_ENV: &str = "GAGGLE_LLM_API_KEY";

    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            max_tokens: 8192,
            retry_backoff: Duration::from_secs(1),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL, Self::DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = GatewayConfig::new("http://localhost:4000/", "llama3");
        assert_eq!(
            cfg.chat_completions_url(),
            "http://localhost:4000/v1/chat/completions"
        );
    }
}
