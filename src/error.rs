//! Error types for the lobby service
//!
//! Lobby operations fail with a typed [`LobbyError`] so that every transport
//! can map each failure to its own representation by exhaustive matching.
//! Bootstrap code (configuration, service wiring) uses `anyhow` instead.

use crate::types::{ChatId, UserId};

/// Result type alias for lobby operations
pub type Result<T> = std::result::Result<T, LobbyError>;

/// Broad classification of a [`LobbyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyErrorKind {
    /// Malformed caller input
    Validation,
    /// A game rule rejected the operation
    Game,
    /// Anything the caller cannot fix
    Internal,
}

/// Errors raised by the lobby state manager and session registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("Game is in progress in a different chat")]
    ChatMismatch { bound: ChatId, requested: ChatId },

    #[error("Game is full")]
    Full { max_players: usize },

    #[error("Player is already in the game")]
    AlreadyJoined { user_id: UserId },

    #[error("Player is not in the game")]
    NotInGame { user_id: UserId },

    #[error("A game is already in progress in this chat")]
    InProgress { chat_id: ChatId },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl LobbyError {
    /// Shorthand for a validation failure
    pub fn validation(reason: impl Into<String>) -> Self {
        LobbyError::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for an internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        LobbyError::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> LobbyErrorKind {
        match self {
            LobbyError::Validation { .. } => LobbyErrorKind::Validation,
            LobbyError::ChatMismatch { .. }
            | LobbyError::Full { .. }
            | LobbyError::AlreadyJoined { .. }
            | LobbyError::NotInGame { .. }
            | LobbyError::InProgress { .. } => LobbyErrorKind::Game,
            LobbyError::Internal { .. } => LobbyErrorKind::Internal,
        }
    }
}
