//! Webhook update handling
//!
//! [`BotHandler`] turns one incoming update into lobby operations and at most
//! one reply. It owns no lobby state of its own; everything goes through the
//! shared [`LobbyManager`].

use crate::bot::commands::{BotCommand, WebAppAction};
use crate::bot::update::{InlineKeyboardMarkup, Message, SendMessage, Update};
use crate::error::{LobbyError, LobbyErrorKind};
use crate::lobby::LobbyManager;
use crate::types::{ChatId, LobbySnapshot, UserId};
use std::sync::Arc;
use tracing::{debug, error, warn};

const WELCOME_TEXT: &str = "Welcome to Domino! 🎲\n\nClick the button below to join the game:";
const JOIN_BUTTON_TEXT: &str = "🎮 Join Game";
const PAYLOAD_ERROR_TEXT: &str = "Error processing game data";
const UNKNOWN_SENDER_TEXT: &str = "Error: Could not identify chat or user";
const INTERNAL_ERROR_TEXT: &str = "Something went wrong. Please try again.";
const NO_GAME_TEXT: &str = "No game in this chat yet. Send /start to open one.";

/// Dispatches webhook updates to the lobby manager
#[derive(Clone)]
pub struct BotHandler {
    lobby_manager: Arc<LobbyManager>,
    web_app_url: String,
}

impl BotHandler {
    pub fn new(lobby_manager: Arc<LobbyManager>, web_app_url: impl Into<String>) -> Self {
        Self {
            lobby_manager,
            web_app_url: web_app_url.into(),
        }
    }

    /// Handle one update, returning the reply to send back, if any
    pub async fn handle_update(&self, update: &Update) -> Option<SendMessage> {
        let message = update.message.as_ref()?;
        let chat_id = message.chat.id;

        if let Some(web_app_data) = &message.web_app_data {
            return Some(self.handle_web_app_data(message, &web_app_data.data).await);
        }

        let command = message.text.as_deref().and_then(BotCommand::parse)?;
        debug!(
            "Bot command {:?} in chat {} (update {})",
            command, chat_id, update.update_id
        );

        let reply = match command {
            BotCommand::Start => self.handle_start(chat_id).await,
            BotCommand::Status => self.handle_status(chat_id),
            BotCommand::Leave => match message.from.as_ref() {
                Some(from) => {
                    self.handle_leave(chat_id, from.id, display_name(message))
                        .await
                }
                None => SendMessage::new(chat_id, UNKNOWN_SENDER_TEXT),
            },
        };

        Some(reply)
    }

    async fn handle_start(&self, chat_id: ChatId) -> SendMessage {
        match self.lobby_manager.start(chat_id).await {
            Ok(_) => SendMessage::new(chat_id, WELCOME_TEXT).with_keyboard(
                InlineKeyboardMarkup::web_app_button(JOIN_BUTTON_TEXT, self.web_app_url.clone()),
            ),
            Err(e) => error_reply(chat_id, &e),
        }
    }

    fn handle_status(&self, chat_id: ChatId) -> SendMessage {
        match self.lobby_manager.status(Some(chat_id)) {
            // A shared lobby bound to another chat is not this chat's game
            Ok(snapshot) if snapshot.chat_id.is_some_and(|bound| bound != chat_id) => {
                SendMessage::new(chat_id, NO_GAME_TEXT)
            }
            Ok(snapshot) => SendMessage::new(chat_id, status_text(&snapshot)),
            Err(e) => error_reply(chat_id, &e),
        }
    }

    async fn handle_web_app_data(&self, message: &Message, data: &str) -> SendMessage {
        let chat_id = message.chat.id;
        let sender = message.from.as_ref().map(|from| from.id);

        let action = match WebAppAction::parse(data, sender) {
            Ok(action) => action,
            Err(e) => {
                warn!("Rejected mini-app payload in chat {}: {}", chat_id, e);
                return SendMessage::new(chat_id, PAYLOAD_ERROR_TEXT);
            }
        };

        let name = display_name(message);
        match action {
            WebAppAction::Join { user_id } => self.handle_join(chat_id, user_id, name).await,
            WebAppAction::Leave { user_id } => self.handle_leave(chat_id, user_id, name).await,
        }
    }

    async fn handle_join(&self, chat_id: ChatId, user_id: UserId, name: &str) -> SendMessage {
        match self.lobby_manager.join(user_id, chat_id).await {
            Ok(snapshot) => {
                let mut text = format!(
                    "Welcome to the game, {}! Players: {}/{}",
                    name, snapshot.player_count, snapshot.max_players
                );
                if snapshot.is_full {
                    text.push_str("\nThe game is full, let's play!");
                }
                SendMessage::new(chat_id, text)
            }
            Err(e) => error_reply(chat_id, &e),
        }
    }

    async fn handle_leave(&self, chat_id: ChatId, user_id: UserId, name: &str) -> SendMessage {
        match self.lobby_manager.leave(user_id, chat_id).await {
            Ok(snapshot) => SendMessage::new(
                chat_id,
                format!(
                    "{} left the game. Players: {}/{}",
                    name, snapshot.player_count, snapshot.max_players
                ),
            ),
            Err(e) => error_reply(chat_id, &e),
        }
    }
}

fn display_name(message: &Message) -> &str {
    message
        .from
        .as_ref()
        .map(|from| from.first_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("Player")
}

fn status_text(snapshot: &LobbySnapshot) -> String {
    match snapshot.status {
        Some(status) => format!(
            "Game status: {}\nPlayers: {}/{}",
            status, snapshot.player_count, snapshot.max_players
        ),
        None => NO_GAME_TEXT.to_string(),
    }
}

fn error_reply(chat_id: ChatId, error: &LobbyError) -> SendMessage {
    match error.kind() {
        LobbyErrorKind::Internal => {
            error!("Lobby operation failed in chat {}: {}", chat_id, error);
            SendMessage::new(chat_id, INTERNAL_ERROR_TEXT)
        }
        _ => SendMessage::new(chat_id, error.to_string()),
    }
}
