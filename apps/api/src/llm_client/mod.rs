/// LLM Client: the single point of entry for all chat-completion calls in JobLens.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Handlers receive an `Arc<dyn LlmProvider>` through `AppState` and never see
/// the API key; the backend is chosen once at startup from `LLM_PROVIDER`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{LlmConfig, ProviderKind};

pub mod huggingface;
pub mod openai;
pub mod prompts;
#[cfg(test)]
pub mod testing;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Message shown to the user. Provider API errors are passed through as-is.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// One system + user exchange. Every call in JobLens is single-turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A chat-completion backend. Implement this to add a provider without
/// touching the intake handlers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short label for logs ("openai", "openrouter", "huggingface").
    fn name(&self) -> &'static str;

    /// Sends the request and returns the generated text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Builds the provider selected in config.
pub fn build_provider(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let transport = HttpTransport::new(config.timeout_secs, config.max_retries)?;
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(openai::OpenAiCompatible::openai(transport, config)),
        ProviderKind::OpenRouter => {
            Arc::new(openai::OpenAiCompatible::openrouter(transport, config))
        }
        ProviderKind::HuggingFace => {
            Arc::new(huggingface::HuggingFaceInference::new(transport, config))
        }
    };
    Ok(provider)
}

/// Shared HTTP plumbing for the provider backends.
/// Retries 429 and 5xx with exponential backoff when `max_retries > 0`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64, max_retries: u32) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    /// Sends the request built by `build` and returns the body of a 2xx response.
    /// `build` is called once per attempt since a `RequestBuilder` is consumed by `send`.
    pub async fn send<F>(&self, build: F) -> Result<String, LlmError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let attempts = self.max_retries + 1;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build(&self.client).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await?;

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_error_message(&body),
                });
                continue;
            }

            if !status.is_success() {
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_error_message(&body),
                });
            }

            debug!("LLM call succeeded with status {status} ({} bytes)", body.len());
            return Ok(body);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Pulls the human-readable message out of a provider error body.
/// OpenAI/OpenRouter use `{"error": {"message": ..}}`, HuggingFace uses `{"error": ".."}`.
fn provider_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(String::from)
    });
    match message {
        Some(m) => m,
        None if body.trim().is_empty() => "empty error response from provider".to_string(),
        None => body.trim().to_string(),
    }
}

/// Parses model output as JSON of type `T`.
/// Accepts bare JSON, fenced JSON, or a JSON object embedded in prose.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let stripped = strip_json_fences(text);
    if stripped.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    match serde_json::from_str(stripped) {
        Ok(value) => Ok(value),
        Err(first_err) => match embedded_object(stripped) {
            Some(candidate) => serde_json::from_str(candidate).map_err(LlmError::Parse),
            None => Err(LlmError::Parse(first_err)),
        },
    }
}

/// The outermost `{ .. }` span, if any.
fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        key: String,
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_json_finds_object_inside_prose() {
        let input = "Sure! Here is the data:\n{\"key\": \"value\"}\nLet me know.";
        let probe: Probe = parse_json(input).unwrap();
        assert_eq!(probe.key, "value");
    }

    #[test]
    fn test_parse_json_empty_is_empty_content() {
        let err = parse_json::<Probe>("   ").unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_parse_json_garbage_is_parse_error() {
        let err = parse_json::<Probe>("no json here").unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_provider_error_message_openai_shape() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(provider_error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_provider_error_message_huggingface_shape() {
        let body = r#"{"error": "Model google/flan-t5-large is currently loading"}"#;
        assert_eq!(
            provider_error_message(body),
            "Model google/flan-t5-large is currently loading"
        );
    }

    #[test]
    fn test_provider_error_message_plain_body() {
        assert_eq!(provider_error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(
            provider_error_message(""),
            "empty error response from provider"
        );
    }

    #[test]
    fn test_user_message_passes_api_message_verbatim() {
        let err = LlmError::Api {
            status: 429,
            message: "You exceeded your current quota".to_string(),
        };
        assert_eq!(err.user_message(), "You exceeded your current quota");
    }

    #[test]
    fn test_chat_request_defaults() {
        let req = ChatRequest::new("sys", "user");
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
        let req = req.with_temperature(0.1).with_max_tokens(256);
        assert_eq!(req.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_truncated_success_body_is_http_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"choices\":",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let transport = HttpTransport::new(5, 0).unwrap();
        let url = format!("http://{addr}/chat/completions");
        let err = transport.send(|c| c.post(&url)).await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)), "unexpected error: {err:?}");
    }
}
