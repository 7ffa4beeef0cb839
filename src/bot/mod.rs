//! Chat-bot collaborator
//!
//! Parses webhook updates from the chat platform, drives the lobby manager
//! and renders the replies. Transport-free: the HTTP layer hands in an
//! [`Update`] and returns the [`SendMessage`] in the webhook response.

pub mod commands;
pub mod handler;
pub mod update;

// Re-export commonly used types
pub use commands::{BotCommand, WebAppAction};
pub use handler::BotHandler;
pub use update::{SendMessage, Update};
