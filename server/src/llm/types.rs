//! Provider-neutral LLM turn types and errors.
//!
//! Shared by the Bedrock and Anthropic clients. Both providers speak the
//! Claude messages envelope, so one set of wire types covers them.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Failures talking to Bedrock or the Anthropic API. Every variant ends up
/// as the same generic 500; the detail is for the log.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("invalid LLM configuration: {0}")]
    ConfigParse(String),

    #[error("LLM credentials incomplete: {var} is unset")]
    MissingCredentials { var: String },

    /// SigV4 signing of a Bedrock request.
    #[error("could not sign model request: {0}")]
    Signing(String),

    #[error("model request failed: {0}")]
    ApiRequest(String),

    /// Non-2xx from the provider. `body` is kept verbatim for the log.
    #[error("model endpoint answered {status}")]
    ApiResponse { status: u16, body: String },

    #[error("unreadable model reply: {0}")]
    ApiParse(String),

    #[error("could not build HTTP client: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// CONTENT BLOCKS
// =============================================================================

/// One block of the Claude reply envelope. Only text matters to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    /// Any other block type (thinking, tool use, future types). Ignored.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Roles accepted in the model's turn list. System text travels separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single turn sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: TurnRole,
    pub content: String,
}

/// Provider reply, reduced to what the gateway logs and returns.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ChatResponse {
    /// First text segment of the reply, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Unknown => None,
        })
    }
}

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// The seam between the chat service and a concrete provider. Tests swap in
/// a recording mock.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// One non-streaming completion: `system` travels outside the turn list.
    ///
    /// # Errors
    ///
    /// Any [`LlmError`] from signing, transport, status, or decoding.
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
