//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! gateway keeps no per-request or per-user state, so the only thing shared
//! is the immutable LLM client.

use std::sync::Arc;

use crate::llm::LlmChat;

#[derive(Clone)]
pub struct AppState {
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self { llm }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
