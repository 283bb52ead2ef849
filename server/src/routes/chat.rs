//! Chat endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use wire::{AGENT_FAILURE, ChatReply, ErrorBody, MESSAGE_REQUIRED};

use crate::services::chat::{self, ChatError};
use crate::state::AppState;

/// `POST /api/chat`: forward one user turn plus history to the LLM.
///
/// Takes raw bytes; a body that is not JSON maps to the generic 500.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    match chat::handle_chat(state.llm.as_ref(), &body).await {
        Ok(message) => Json(ChatReply { message }).into_response(),
        Err(err) => {
            let status = chat_error_to_status(&err);
            if status.is_server_error() {
                tracing::error!(error = %err, "chat request failed");
            } else {
                tracing::warn!(error = %err, "chat request rejected");
            }
            (status, Json(error_body(&err))).into_response()
        }
    }
}

pub(crate) fn chat_error_to_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::MissingMessage => StatusCode::BAD_REQUEST,
        ChatError::MalformedBody(_) | ChatError::LlmNotConfigured | ChatError::Llm(_) | ChatError::EmptyReply => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Client-facing body. Upstream detail stays in the server log.
fn error_body(err: &ChatError) -> ErrorBody {
    match err {
        ChatError::MissingMessage => ErrorBody::new(MESSAGE_REQUIRED),
        _ => ErrorBody::new(AGENT_FAILURE),
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
