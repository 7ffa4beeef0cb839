//! Common types used throughout the lobby service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat platform user identifier
pub type UserId = i64;

/// Chat identifier (group chats carry negative ids)
pub type ChatId = i64;

/// Unique identifier for one lobby incarnation
pub type LobbyId = Uuid;

/// Lifecycle status of a lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    Waiting,
    Playing,
    Finished,
}

impl std::fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyStatus::Waiting => write!(f, "waiting"),
            LobbyStatus::Playing => write!(f, "playing"),
            LobbyStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Which lobby variant the service runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyMode {
    /// One process-wide lobby shared by every chat
    #[default]
    Shared,
    /// One lobby per chat, created lazily and retired when finished
    PerChat,
}

impl std::fmt::Display for LobbyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyMode::Shared => write!(f, "shared"),
            LobbyMode::PerChat => write!(f, "per_chat"),
        }
    }
}

impl std::str::FromStr for LobbyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" | "single" => Ok(LobbyMode::Shared),
            "per_chat" | "per-chat" | "chat" => Ok(LobbyMode::PerChat),
            other => Err(format!("Invalid lobby mode: {}", other)),
        }
    }
}

/// Read-only projection of a lobby's membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    /// `None` when no lobby exists yet for the requested key
    pub lobby_id: Option<LobbyId>,
    pub chat_id: Option<ChatId>,
    /// Sorted ascending; consumers treat it as a set
    pub players: Vec<UserId>,
    pub player_count: usize,
    pub max_players: usize,
    pub is_full: bool,
    pub status: Option<LobbyStatus>,
}

impl LobbySnapshot {
    /// Snapshot reported when no lobby exists for a key
    pub fn empty(max_players: usize) -> Self {
        Self {
            lobby_id: None,
            chat_id: None,
            players: Vec::new(),
            player_count: 0,
            max_players,
            is_full: false,
            status: None,
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.players.contains(&user_id)
    }
}

/// Event emitted when a user joins a lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedLobby {
    pub lobby_id: LobbyId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub current_players: Vec<UserId>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a user leaves a lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeftLobby {
    pub lobby_id: LobbyId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub remaining_players: Vec<UserId>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a lobby reaches capacity and switches to playing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStarting {
    pub lobby_id: LobbyId,
    pub chat_id: ChatId,
    pub players: Vec<UserId>,
    pub timestamp: DateTime<Utc>,
}

/// Why a lobby was dropped from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetireReason {
    /// The last player left
    Emptied,
    /// Nobody joined within the idle timeout
    Idle,
    /// A fresh `start` replaced a finished lobby
    Replaced,
}

/// Event emitted when a lobby is removed from the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyRetired {
    pub lobby_id: LobbyId,
    pub chat_id: Option<ChatId>,
    pub reason: RetireReason,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all lobby events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyEvent {
    PlayerJoinedLobby(PlayerJoinedLobby),
    PlayerLeftLobby(PlayerLeftLobby),
    GameStarting(GameStarting),
    LobbyRetired(LobbyRetired),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_mode_parsing() {
        assert_eq!("shared".parse::<LobbyMode>(), Ok(LobbyMode::Shared));
        assert_eq!("PER_CHAT".parse::<LobbyMode>(), Ok(LobbyMode::PerChat));
        assert!("global".parse::<LobbyMode>().is_err());
    }

    #[test]
    fn test_empty_snapshot_serialization() {
        let json = serde_json::to_value(LobbySnapshot::empty(4)).unwrap();
        assert_eq!(json["chatId"], serde_json::Value::Null);
        assert_eq!(json["playerCount"], 0);
        assert_eq!(json["maxPlayers"], 4);
        assert_eq!(json["players"], serde_json::json!([]));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(LobbyStatus::Playing).unwrap(),
            serde_json::json!("playing")
        );
    }
}
