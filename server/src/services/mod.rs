//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the chat logic so route handlers can stay focused on
//! protocol translation (status codes and JSON bodies).

pub mod chat;
