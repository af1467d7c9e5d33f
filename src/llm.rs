//! Language-model boundary.
//!
//! The pipeline only sees [`ChatModel`]; [`OpenAiChatModel`] speaks the
//! OpenAI chat-completions protocol, so any compatible endpoint works by
//! pointing `llm.base_url` at it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::models::Turn;

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the assistant reply for `request.messages`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

/// Chat-completions client for OpenAI and compatible APIs.
///
/// `OPENAI_API_KEY` is read per call; a missing key fails only that request.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = request_body(request);

        tracing::debug!(model = %request.model, messages = request.messages.len(), "requesting completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let json: Value = resp.json().await?;
        parse_completion(&json)
    }
}

fn request_body(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    json!({
        "model": request.model,
        "messages": messages,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
    })
}

/// `choices[0].message.content`, trimmed. Empty content counts as malformed.
pub fn parse_completion(json: &Value) -> Result<String, GenerationError> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| GenerationError::Malformed("no choices in response".to_string()))?;

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| GenerationError::Malformed("choice has no message content".to_string()))?
        .trim();

    if content.is_empty() {
        return Err(GenerationError::Malformed("empty message content".to_string()));
    }
    Ok(content.to_string())
}
