//! Network layer: the chat gateway port and its HTTP implementation.

pub mod api;
