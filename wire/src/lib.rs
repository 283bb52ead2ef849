//! Shared chat contract for the `/api/chat` endpoint.
//!
//! This crate owns the JSON shapes exchanged between `server` and `client`,
//! plus the fixed strings and limits both sides agree on. Field names follow
//! the browser page's camelCase (`conversationHistory`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Path of the chat endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Number of most recent messages forwarded to the model.
pub const HISTORY_WINDOW: usize = 20;

/// Error body text for a request without a usable `message`.
pub const MESSAGE_REQUIRED: &str = "Message is required";

/// Error body text for every downstream failure.
pub const AGENT_FAILURE: &str = "Failed to get response from AI agent";

/// Error returned by [`Role::from_str`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Instructions or background material; never shown as a chat bubble.
    System,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged turn. Conversations are ordered oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Body of `POST /api/chat` as sent by the client.
///
/// The server does not deserialize into this type directly: it validates a
/// loose JSON value so that malformed history entries can be dropped one by
/// one instead of failing the request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "conversationHistory", default)]
    pub conversation_history: Vec<Message>,
}

/// Success body: the assistant's reply text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

/// Failure body for 400 and 500 responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
