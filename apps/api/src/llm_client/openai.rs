//! OpenAI-compatible chat-completion backend. Serves both OpenAI and OpenRouter,
//! which share the request/response shape and differ in base URL and headers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatRequest, HttpTransport, LlmError, LlmProvider};
use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiCompatible {
    transport: HttpTransport,
    label: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
    extra_headers: Vec<(&'static str, String)>,
}

impl OpenAiCompatible {
    pub fn openai(transport: HttpTransport, config: &LlmConfig) -> Self {
        Self {
            transport,
            label: "openai",
            endpoint: chat_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            extra_headers: Vec::new(),
        }
    }

    /// OpenRouter asks callers to identify themselves via `HTTP-Referer` and `X-Title`.
    pub fn openrouter(transport: HttpTransport, config: &LlmConfig) -> Self {
        Self {
            transport,
            label: "openrouter",
            endpoint: chat_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            extra_headers: vec![
                ("HTTP-Referer", config.openrouter_referer.clone()),
                ("X-Title", config.openrouter_title.clone()),
            ],
        }
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Reads `choices[0].message.content` from a chat-completion body.
fn parse_chat_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| {
            LlmError::UnexpectedShape("response has no choices[0].message.content".to_string())
        })?;
    if content.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(content)
}

#[async_trait]
impl LlmProvider for OpenAiCompatible {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let raw = self
            .transport
            .send(|client| {
                let mut builder = client
                    .post(&self.endpoint)
                    .bearer_auth(&self.api_key)
                    .json(&body);
                for (name, value) in &self.extra_headers {
                    builder = builder.header(*name, value);
                }
                builder
            })
            .await?;

        parse_chat_completion(&raw)
    }
}
