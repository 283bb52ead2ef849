//! Conversation state for the review chat panel.
//!
//! DESIGN
//! ======
//! `ConversationClient` owns the visible message list plus the transient
//! flags the page needs (`pending_input`, `waiting`, `context_loaded`). All
//! of it sits behind one mutex that is released before the gateway call, so
//! concurrent `submit` calls see the in-flight flag and back off.
//!
//! PERSISTENCE
//! ===========
//! After every change that leaves the list non-empty the whole list is saved
//! under [`CONVERSATION_KEY`]. `clear` is the only operation that removes it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wire::{ChatRequest, Message};

use crate::net::api::ChatGateway;
use crate::util::persistence::{self, CONVERSATION_KEY, ConversationStore};

/// Prefix of the system message that carries the context document.
pub const CONTEXT_LEAD_IN: &str =
    "Here is the context document that should be referenced throughout this conversation:\n\n";

/// Assistant bubble appended when the gateway call fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// What a submit attempt did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or another request was already in flight.
    Ignored,
    /// The gateway answered and the reply was appended.
    Replied,
    /// The gateway failed and the apology was appended.
    Failed,
}

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<Message>,
    pending_input: String,
    waiting: bool,
    context_loaded: bool,
    context: Option<String>,
}

impl ConversationState {
    fn has_context(&self) -> bool {
        self.context.as_deref().is_some_and(|doc| !doc.is_empty())
    }

    /// History sent with the next request: the current list, led by the
    /// context system message once the context has been loaded.
    fn outbound_history(&self) -> Vec<Message> {
        let mut history = Vec::with_capacity(self.messages.len() + 1);
        if self.context_loaded {
            if let Some(doc) = self.context.as_deref().filter(|doc| !doc.is_empty()) {
                history.push(Message::system(format!("{CONTEXT_LEAD_IN}{doc}")));
            }
        }
        history.extend(self.messages.iter().cloned());
        history
    }
}

pub struct ConversationClient {
    state: Mutex<ConversationState>,
    gateway: Arc<dyn ChatGateway>,
    store: Arc<dyn ConversationStore>,
}

impl ConversationClient {
    /// Restore any persisted conversation. Unreadable data starts the
    /// conversation empty; the context always starts unloaded.
    #[must_use]
    pub fn mount(
        gateway: Arc<dyn ChatGateway>,
        store: Arc<dyn ConversationStore>,
        context: Option<String>,
    ) -> Self {
        let messages: Vec<Message> =
            persistence::load_json(store.as_ref(), CONVERSATION_KEY).unwrap_or_default();
        tracing::debug!(restored = messages.len(), "conversation mounted");
        Self {
            state: Mutex::new(ConversationState { messages, context, ..ConversationState::default() }),
            gateway,
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, messages: &[Message]) {
        if !messages.is_empty() {
            persistence::save_json(self.store.as_ref(), CONVERSATION_KEY, &messages);
        }
    }

    // =============================================================
    // Accessors
    // =============================================================

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.lock().waiting
    }

    #[must_use]
    pub fn context_loaded(&self) -> bool {
        self.lock().context_loaded
    }

    /// True when a non-empty context document is attached.
    #[must_use]
    pub fn has_context(&self) -> bool {
        self.lock().has_context()
    }

    #[must_use]
    pub fn pending_input(&self) -> String {
        self.lock().pending_input.clone()
    }

    // =============================================================
    // Mutations
    // =============================================================

    pub fn set_pending_input(&self, text: impl Into<String>) {
        self.lock().pending_input = text.into();
    }

    /// Replace the context document. The new document must be loaded again
    /// before it is sent.
    pub fn set_context_document(&self, context: Option<String>) {
        let mut state = self.lock();
        state.context = context;
        state.context_loaded = false;
    }

    /// Mark the context document as loaded. Returns whether a document was
    /// present; nothing is sent.
    pub fn load_context(&self) -> bool {
        let mut state = self.lock();
        if !state.has_context() {
            return false;
        }
        state.context_loaded = true;
        true
    }

    /// Forget the conversation, locally and in storage.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.messages.clear();
        state.context_loaded = false;
        persistence::remove(self.store.as_ref(), CONVERSATION_KEY);
    }

    // =============================================================
    // Submit
    // =============================================================

    /// Send `text` as the next user turn and append the reply (or the
    /// apology) when the gateway answers.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let request = {
            let mut state = self.lock();
            self.begin(&mut state, text)
        };
        match request {
            Some(request) => self.finish(request).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// Submit the pending input, clearing it once the turn starts. Pending
    /// input survives an ignored attempt.
    pub async fn submit_pending(&self) -> SubmitOutcome {
        let request = {
            let mut state = self.lock();
            let text = state.pending_input.clone();
            let request = self.begin(&mut state, &text);
            if request.is_some() {
                state.pending_input.clear();
            }
            request
        };
        match request {
            Some(request) => self.finish(request).await,
            None => SubmitOutcome::Ignored,
        }
    }

    fn begin(&self, state: &mut ConversationState, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || state.waiting {
            return None;
        }
        let conversation_history = state.outbound_history();
        state.messages.push(Message::user(text));
        state.waiting = true;
        self.persist(&state.messages);
        Some(ChatRequest { message: text.to_owned(), conversation_history })
    }

    async fn finish(&self, request: ChatRequest) -> SubmitOutcome {
        let result = self.gateway.send(&request).await;

        let mut state = self.lock();
        state.waiting = false;
        let outcome = match result {
            Ok(reply) => {
                state.messages.push(Message::assistant(reply));
                SubmitOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                state.messages.push(Message::assistant(APOLOGY));
                SubmitOutcome::Failed
            }
        };
        self.persist(&state.messages);
        outcome
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod conversation_test;
