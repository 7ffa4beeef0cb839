//! Lobby event publishing
//!
//! The lobby manager reports every membership change through an
//! [`EventPublisher`] after its lock has been released. Publishing is
//! best-effort: a failed publish is logged and never undoes the mutation.

use crate::error::Result;
use crate::types::{GameStarting, LobbyEvent, LobbyRetired, PlayerJoinedLobby, PlayerLeftLobby};
use async_trait::async_trait;
use tracing::info;

/// Trait for publishing lobby events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a PlayerJoinedLobby event
    async fn publish_player_joined_lobby(&self, event: PlayerJoinedLobby) -> Result<()>;

    /// Publish a PlayerLeftLobby event
    async fn publish_player_left_lobby(&self, event: PlayerLeftLobby) -> Result<()>;

    /// Publish a GameStarting event
    async fn publish_game_starting(&self, event: GameStarting) -> Result<()>;

    /// Publish a LobbyRetired event
    async fn publish_lobby_retired(&self, event: LobbyRetired) -> Result<()>;

    /// Dispatch any event to its typed method
    async fn publish(&self, event: LobbyEvent) -> Result<()> {
        match event {
            LobbyEvent::PlayerJoinedLobby(event) => self.publish_player_joined_lobby(event).await,
            LobbyEvent::PlayerLeftLobby(event) => self.publish_player_left_lobby(event).await,
            LobbyEvent::GameStarting(event) => self.publish_game_starting(event).await,
            LobbyEvent::LobbyRetired(event) => self.publish_lobby_retired(event).await,
        }
    }
}

/// Publisher that writes every event to the structured log
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish_player_joined_lobby(&self, event: PlayerJoinedLobby) -> Result<()> {
        info!(
            lobby_id = %event.lobby_id,
            chat_id = event.chat_id,
            user_id = event.user_id,
            player_count = event.current_players.len(),
            "PlayerJoinedLobby"
        );
        Ok(())
    }

    async fn publish_player_left_lobby(&self, event: PlayerLeftLobby) -> Result<()> {
        info!(
            lobby_id = %event.lobby_id,
            chat_id = event.chat_id,
            user_id = event.user_id,
            player_count = event.remaining_players.len(),
            "PlayerLeftLobby"
        );
        Ok(())
    }

    async fn publish_game_starting(&self, event: GameStarting) -> Result<()> {
        info!(
            lobby_id = %event.lobby_id,
            chat_id = event.chat_id,
            players = ?event.players,
            "GameStarting"
        );
        Ok(())
    }

    async fn publish_lobby_retired(&self, event: LobbyRetired) -> Result<()> {
        info!(
            lobby_id = %event.lobby_id,
            chat_id = ?event.chat_id,
            reason = ?event.reason,
            "LobbyRetired"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RetireReason;
    use crate::utils::{current_timestamp, generate_lobby_id};

    #[tokio::test]
    async fn test_tracing_publisher_accepts_all_events() {
        let publisher = TracingEventPublisher::new();
        let lobby_id = generate_lobby_id();

        let events = vec![
            LobbyEvent::PlayerJoinedLobby(PlayerJoinedLobby {
                lobby_id,
                chat_id: 100,
                user_id: 1,
                current_players: vec![1],
                timestamp: current_timestamp(),
            }),
            LobbyEvent::GameStarting(GameStarting {
                lobby_id,
                chat_id: 100,
                players: vec![1, 2, 3, 4],
                timestamp: current_timestamp(),
            }),
            LobbyEvent::PlayerLeftLobby(PlayerLeftLobby {
                lobby_id,
                chat_id: 100,
                user_id: 1,
                remaining_players: vec![],
                timestamp: current_timestamp(),
            }),
            LobbyEvent::LobbyRetired(LobbyRetired {
                lobby_id,
                chat_id: Some(100),
                reason: RetireReason::Emptied,
                timestamp: current_timestamp(),
            }),
        ];

        for event in events {
            assert!(publisher.publish(event).await.is_ok());
        }
    }
}
