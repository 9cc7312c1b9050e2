//! OpenRouter chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AiError;
use crate::model::LanguageModel;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "ibm-granite/granite-4.0-h-micro";

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        let payload: JsonValue = resp
            .json()
            .await
            .map_err(|e| AiError::UnexpectedResponse(format!("HTTP {status}: {e}")))?;

        let content = parse_completion(status.is_success(), &payload)?;
        tracing::debug!(
            model = %self.config.model,
            bytes = content.len(),
            "model completion received"
        );
        Ok(content)
    }
}

/// Pull the first choice's message content out of a chat-completions body.
fn parse_completion(success: bool, payload: &JsonValue) -> Result<String, AiError> {
    if let Some(err) = payload.get("error") {
        return Err(AiError::Api(err.to_string()));
    }
    if !success {
        return Err(AiError::Api(payload.to_string()));
    }

    let first = payload
        .get("choices")
        .and_then(JsonValue::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| AiError::UnexpectedResponse(payload.to_string()))?;

    first
        .pointer("/message/content")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| AiError::UnexpectedResponse(payload.to_string()))
}
