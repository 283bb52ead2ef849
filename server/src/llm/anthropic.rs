//! Direct Anthropic provider: `POST {base}/v1/messages` with an API key.
//!
//! Also home of the reply-envelope handling (`read_response`,
//! `parse_response`) that Bedrock shares, since both return the same Claude
//! messages body.

use super::config::LlmTimeouts;
use super::types::{ChatResponse, ContentBlock, LlmError, Message};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(base_url: &str, api_key: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = build_http(timeouts)?;
        Ok(Self { http, endpoint: format!("{base_url}/v1/messages"), api_key })
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let body = ApiRequest { model, max_tokens, system, messages };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        read_response(response).await
    }
}

pub(super) fn build_http(timeouts: LlmTimeouts) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| LlmError::HttpClientBuild(e.to_string()))
}

/// Non-2xx is an error carrying the raw body; anything else is decoded.
pub(super) async fn read_response(response: reqwest::Response) -> Result<ChatResponse, LlmError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| LlmError::ApiRequest(e.to_string()))?;
    if !status.is_success() {
        return Err(LlmError::ApiResponse { status: status.as_u16(), body });
    }
    parse_response(&body)
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Messages API body. `model` lives in the URL for Bedrock, so Bedrock has its
/// own body type.
#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(serde::Deserialize)]
struct Envelope {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(serde::Deserialize, Default)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

// =============================================================================
// PARSING
// =============================================================================

pub(super) fn parse_response(json: &str) -> Result<ChatResponse, LlmError> {
    let Envelope { mut content, model, stop_reason, usage } =
        serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    content.retain(|block| matches!(block, ContentBlock::Text { .. }));

    Ok(ChatResponse {
        content,
        model,
        stop_reason,
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    })
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
