//! Domino Lobby - membership coordinator for a chat mini-game
//!
//! This crate tracks which users have joined a domino table tied to a chat,
//! enforces the player cap, and exposes it through an HTTP API used by the
//! browser mini-app and a chat-bot webhook.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod lobby;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LobbyError, LobbyErrorKind, Result};
pub use types::*;

// Re-export key components
pub use events::{EventPublisher, TracingEventPublisher};
pub use lobby::{LobbyManager, LobbyManagerStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
