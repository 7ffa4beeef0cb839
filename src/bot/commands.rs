//! Bot command and mini-app payload parsing

use crate::error::{LobbyError, Result};
use crate::lobby::validation::validate_user_id;
use crate::types::UserId;
use serde_json::Value;

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Status,
    Leave,
}

impl BotCommand {
    /// Parse the first word of a message, accepting `/cmd@botname`
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let command = command.split('@').next().unwrap_or(command);

        match command.to_lowercase().as_str() {
            "start" => Some(BotCommand::Start),
            "status" => Some(BotCommand::Status),
            "leave" => Some(BotCommand::Leave),
            _ => None,
        }
    }
}

/// Membership action sent by the mini-app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebAppAction {
    Join { user_id: UserId },
    Leave { user_id: UserId },
}

impl WebAppAction {
    /// Parse a `{ "action": "join"|"leave", "userId": n }` payload
    ///
    /// `userId` falls back to `sender` when the payload omits it.
    pub fn parse(data: &str, sender: Option<UserId>) -> Result<Self> {
        let payload: Value = serde_json::from_str(data)
            .map_err(|e| LobbyError::validation(format!("Malformed mini-app payload: {}", e)))?;

        let user_id = match (payload.get("userId"), sender) {
            (None, Some(sender)) => sender,
            (value, _) => validate_user_id(value)?,
        };

        match payload.get("action").and_then(Value::as_str) {
            Some("join") => Ok(WebAppAction::Join { user_id }),
            Some("leave") => Ok(WebAppAction::Leave { user_id }),
            Some(other) => Err(LobbyError::validation(format!("Unknown action: {}", other))),
            None => Err(LobbyError::validation("Missing action")),
        }
    }
}
