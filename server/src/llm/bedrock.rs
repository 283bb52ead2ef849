//! AWS Bedrock runtime client for Anthropic models.
//!
//! DESIGN
//! ======
//! Calls `InvokeModel` (`POST /model/{modelId}/invoke`) with the Claude
//! messages body plus `anthropic_version`. Requests are signed with SigV4
//! from static credentials; the reply envelope is the same one the
//! Anthropic API returns, so parsing is shared with `anthropic.rs`.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use super::anthropic::{build_http, read_response};
use super::config::{AwsCredentials, LlmTimeouts};
use super::sigv4::{self, SigningScope};
use super::types::{ChatResponse, LlmError, Message};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const SERVICE: &str = "bedrock";
const CONTENT_TYPE: &str = "application/json";

// =============================================================================
// CLIENT
// =============================================================================

pub struct BedrockClient {
    http: reqwest::Client,
    base_url: String,
    region: String,
    credentials: AwsCredentials,
}

impl BedrockClient {
    pub fn new(
        base_url: &str,
        region: String,
        credentials: AwsCredentials,
        timeouts: LlmTimeouts,
    ) -> Result<Self, LlmError> {
        let http = build_http(timeouts)?;
        Ok(Self { http, base_url: base_url.to_string(), region, credentials })
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let body = serde_json::to_vec(&InvokeBody { anthropic_version: ANTHROPIC_VERSION, max_tokens, system, messages })
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let url = reqwest::Url::parse(&invoke_url(&self.base_url, model))
            .map_err(|e| LlmError::ConfigParse(format!("invalid bedrock URL: {e}")))?;
        let host = host_header(&url)?;

        let headers = BTreeMap::from([
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("host".to_string(), host),
        ]);
        let scope = SigningScope { region: &self.region, service: SERVICE };
        let signed = sigv4::sign(&self.credentials, &scope, "POST", url.path(), headers, &body, OffsetDateTime::now_utc())?;

        let mut request = self.http.post(url).header("accept", CONTENT_TYPE).body(body);
        for (name, value) in &signed {
            // reqwest derives Host from the URL.
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        read_response(response).await
    }
}

fn invoke_url(base_url: &str, model: &str) -> String {
    format!("{base_url}/model/{}/invoke", sigv4::uri_encode(model, true))
}

fn host_header(url: &reqwest::Url) -> Result<String, LlmError> {
    let host = url
        .host_str()
        .ok_or_else(|| LlmError::ConfigParse(format!("bedrock URL has no host: {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[cfg(test)]
#[path = "bedrock_test.rs"]
mod tests;
