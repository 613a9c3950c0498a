//! HuggingFace Inference API backend (text-generation task).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatRequest, HttpTransport, LlmError, LlmProvider};
use crate::config::LlmConfig;

const DEFAULT_MAX_LENGTH: u32 = 512;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

/// The endpoint answers with either a list of generations or a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<Generation>),
    One(Generation),
}

pub struct HuggingFaceInference {
    transport: HttpTransport,
    endpoint: String,
    api_key: String,
}

impl HuggingFaceInference {
    pub fn new(transport: HttpTransport, config: &LlmConfig) -> Self {
        Self {
            transport,
            endpoint: format!(
                "{}/models/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        }
    }
}

/// Text-generation models take a single prompt; the system text leads it.
fn build_inputs(request: &ChatRequest) -> String {
    if request.system.trim().is_empty() {
        request.user.clone()
    } else {
        format!("{}\n\n{}", request.system.trim(), request.user)
    }
}

fn parse_generated_text(body: &str) -> Result<String, LlmError> {
    let response: InferenceResponse = serde_json::from_str(body).map_err(|_| {
        LlmError::UnexpectedShape("expected [{generated_text}] or {generated_text}".to_string())
    })?;
    let text = match response {
        InferenceResponse::Many(generations) => generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| LlmError::UnexpectedShape("empty generation list".to_string()))?,
        InferenceResponse::One(generation) => generation.generated_text,
    };
    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for HuggingFaceInference {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let inputs = build_inputs(request);
        let body = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                max_length: request.max_tokens.unwrap_or(DEFAULT_MAX_LENGTH),
                temperature: request.temperature,
            },
        };

        let raw = self
            .transport
            .send(|client| {
                client
                    .post(&self.endpoint)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            })
            .await?;

        parse_generated_text(&raw)
    }
}
