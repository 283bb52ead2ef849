//! Client-side state.

pub mod conversation;
