//! Chat gateway: validate and window one chat turn, then forward it to the LLM.
//!
//! DESIGN
//! ======
//! Stateless: everything the model sees comes from the request body. The
//! pipeline is `parse_request` → `compose` → `LlmChat::chat` → `reply_text`.
//!
//! History policy:
//! - malformed history entries are dropped one by one, never fatal;
//! - the new user message is appended, then only the last
//!   [`wire::HISTORY_WINDOW`] messages are kept (oldest dropped first);
//! - surviving `system` messages are pulled out of the turn list, joined with
//!   blank lines, and followed by [`DEFAULT_INSTRUCTION`] to form the model's
//!   system text.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use wire::{HISTORY_WINDOW, Message, Role};

use crate::llm::LlmChat;
use crate::llm::types::{self, ChatResponse, LlmError, TurnRole};

/// Output bound for every model call.
pub const MAX_TOKENS: u32 = 1000;

/// Instruction appended after any caller-supplied system text.
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful AI assistant for code review. \
Answer questions about pull requests, diffs, and code clearly and concisely. \
When a context document has been provided, treat it as background knowledge and reference it where relevant.";

const SYSTEM_SEPARATOR: &str = "\n\n";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message is required")]
    MissingMessage,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("model reply contained no text")]
    EmptyReply,
}

/// A validated request: the new user message plus the well-formed history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub message: String,
    pub history: Vec<Message>,
}

/// What gets sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub system: String,
    pub messages: Vec<types::Message>,
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Run one chat turn end to end and return the assistant's reply text.
///
/// # Errors
///
/// [`ChatError::MissingMessage`] for a request without a usable message; any
/// other variant for body, configuration, or upstream failures.
pub async fn handle_chat(llm: Option<&Arc<dyn LlmChat>>, body: &[u8]) -> Result<String, ChatError> {
    let turn = parse_request(body)?;
    let llm = llm.ok_or(ChatError::LlmNotConfigured)?;

    let history_len = turn.history.len();
    let request = compose(turn);
    info!(
        history_len,
        forwarded = request.messages.len(),
        system_len = request.system.len(),
        "chat: forwarding turn"
    );

    let response = llm.chat(MAX_TOKENS, &request.system, &request.messages).await?;
    info!(
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        stop_reason = response.stop_reason.as_deref().unwrap_or(""),
        "chat: reply received"
    );
    reply_text(&response)
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Check the raw body against the chat contract.
///
/// # Errors
///
/// [`ChatError::MalformedBody`] if the body is not JSON;
/// [`ChatError::MissingMessage`] if `message` is absent, not a string, or blank.
pub fn parse_request(body: &[u8]) -> Result<ChatTurn, ChatError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ChatError::MalformedBody(e.to_string()))?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or(ChatError::MissingMessage)?
        .to_string();

    let history = value
        .get("conversationHistory")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(history_entry).collect())
        .unwrap_or_default();

    Ok(ChatTurn { message, history })
}

/// A history entry survives only as an object with a known role and
/// non-blank string content.
fn history_entry(value: &Value) -> Option<Message> {
    let role: Role = value.get("role")?.as_str()?.parse().ok()?;
    let content = value.get("content")?.as_str()?;
    if content.trim().is_empty() {
        return None;
    }
    Some(Message::new(role, content))
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Append the user message, apply the sliding window, and split out system text.
#[must_use]
pub fn compose(turn: ChatTurn) -> ModelRequest {
    let mut conversation = turn.history;
    conversation.push(Message::user(turn.message));
    let windowed = sliding_window(conversation, HISTORY_WINDOW);

    let mut system_parts = Vec::new();
    let mut messages = Vec::with_capacity(windowed.len());
    for msg in windowed {
        let role = match msg.role {
            Role::User => TurnRole::User,
            Role::Assistant => TurnRole::Assistant,
            Role::System => {
                system_parts.push(msg.content);
                continue;
            }
        };
        messages.push(types::Message { role, content: msg.content });
    }

    ModelRequest { system: merge_system(&system_parts), messages }
}

/// Keep the last `limit` messages, dropping from the front.
#[must_use]
pub fn sliding_window(mut messages: Vec<Message>, limit: usize) -> Vec<Message> {
    let excess = messages.len().saturating_sub(limit);
    messages.drain(..excess);
    messages
}

/// Caller system texts in order, then the default instruction, blank-line joined.
#[must_use]
pub fn merge_system(parts: &[String]) -> String {
    parts
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(DEFAULT_INSTRUCTION))
        .collect::<Vec<_>>()
        .join(SYSTEM_SEPARATOR)
}

// =============================================================================
// RESPONSE SHAPING
// =============================================================================

/// First text segment of the model reply.
///
/// # Errors
///
/// [`ChatError::EmptyReply`] when the reply carries no text block.
pub fn reply_text(response: &ChatResponse) -> Result<String, ChatError> {
    response
        .first_text()
        .map(str::to_string)
        .ok_or(ChatError::EmptyReply)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
