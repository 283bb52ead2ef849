//! # client
//!
//! Conversation client for the review-chat gateway.
//!
//! Owns the visible conversation, persists it through an injected storage
//! port, optionally seeds the model with a context document, and talks to
//! `POST /api/chat` through an injected gateway port. The `cli` crate is a
//! thin shell over [`ConversationClient`].

pub mod net;
pub mod state;
pub mod util;

pub use net::api::{ChatGateway, GatewayError, HttpGateway};
pub use state::conversation::{ConversationClient, SubmitOutcome};
pub use util::persistence::{ConversationStore, FileStore, MemoryStore, StoreError};
