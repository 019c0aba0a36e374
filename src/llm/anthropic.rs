//! Anthropic Messages API provider implementation

use super::types::*;
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    /// Sent as `x-api-key` when present; requests go out unauthenticated otherwise
    api_key: Option<String>,
    model: String,
    api_url: String,
}

impl AnthropicService {
    pub fn new(api_key: Option<String>, model: String, api_url: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            api_url,
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::auth(format!("Authentication failed: {body}")),
            429 => LlmError::rate_limit(format!("Rate limited: {body}")),
            400 => LlmError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => LlmError::server_error(format!("Server error: {body}")),
            _ => LlmError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

fn normalize_response(resp: AnthropicResponse) -> LlmResponse {
    let content = resp
        .content
        .into_iter()
        .map(|block| match block.text {
            Some(text) => ContentBlock::Text { text },
            None => ContentBlock::Other {
                kind: block.kind.unwrap_or_else(|| "unknown".to_string()),
            },
        })
        .collect();

    let usage = resp.usage.unwrap_or_default();

    LlmResponse {
        content,
        usage: Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        },
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let anthropic_request = self.translate_request(request);

        let mut builder = self
            .client
            .post(&self.api_url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let anthropic_response: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::malformed(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(normalize_response(anthropic_response))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

/// Content goes on the wire as a plain string
#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

/// Only `text` is consumed; `type` is optional on the wire
#[derive(Debug, Deserialize)]
struct AnthropicResponseBlock {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}
