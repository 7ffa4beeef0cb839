//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use domino_lobby::api::{create_router, ApiState};
use domino_lobby::bot::BotHandler;
use domino_lobby::config::LobbyConfig;
use domino_lobby::error::{LobbyError, Result};
use domino_lobby::events::EventPublisher;
use domino_lobby::lobby::LobbyManager;
use domino_lobby::types::{
    GameStarting, LobbyEvent, LobbyMode, LobbyRetired, PlayerJoinedLobby, PlayerLeftLobby,
    RetireReason,
};
use std::sync::{Arc, Mutex};

/// Mock event publisher that captures published events for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: Arc<Mutex<Vec<LobbyEvent>>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events (for testing)
    pub fn get_published_events(&self) -> Vec<LobbyEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| match event {
                LobbyEvent::PlayerJoinedLobby(_) => event_type == "PlayerJoinedLobby",
                LobbyEvent::PlayerLeftLobby(_) => event_type == "PlayerLeftLobby",
                LobbyEvent::GameStarting(_) => event_type == "GameStarting",
                LobbyEvent::LobbyRetired(_) => event_type == "LobbyRetired",
            })
            .count()
    }

    /// Reasons of every retirement seen so far, in order
    pub fn retire_reasons(&self) -> Vec<RetireReason> {
        self.get_published_events()
            .iter()
            .filter_map(|event| match event {
                LobbyEvent::LobbyRetired(retired) => Some(retired.reason),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: LobbyEvent) {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish_player_joined_lobby(&self, event: PlayerJoinedLobby) -> Result<()> {
        self.record(LobbyEvent::PlayerJoinedLobby(event));
        Ok(())
    }

    async fn publish_player_left_lobby(&self, event: PlayerLeftLobby) -> Result<()> {
        self.record(LobbyEvent::PlayerLeftLobby(event));
        Ok(())
    }

    async fn publish_game_starting(&self, event: GameStarting) -> Result<()> {
        self.record(LobbyEvent::GameStarting(event));
        Ok(())
    }

    async fn publish_lobby_retired(&self, event: LobbyRetired) -> Result<()> {
        self.record(LobbyEvent::LobbyRetired(event));
        Ok(())
    }
}

/// Publisher whose every publish fails
#[derive(Debug, Default)]
pub struct FailingEventPublisher;

#[async_trait]
impl EventPublisher for FailingEventPublisher {
    async fn publish_player_joined_lobby(&self, _event: PlayerJoinedLobby) -> Result<()> {
        Err(LobbyError::internal("event sink unavailable"))
    }

    async fn publish_player_left_lobby(&self, _event: PlayerLeftLobby) -> Result<()> {
        Err(LobbyError::internal("event sink unavailable"))
    }

    async fn publish_game_starting(&self, _event: GameStarting) -> Result<()> {
        Err(LobbyError::internal("event sink unavailable"))
    }

    async fn publish_lobby_retired(&self, _event: LobbyRetired) -> Result<()> {
        Err(LobbyError::internal("event sink unavailable"))
    }
}

pub fn lobby_config(mode: LobbyMode, max_players: usize) -> LobbyConfig {
    LobbyConfig {
        mode,
        max_players,
        ..LobbyConfig::default()
    }
}

/// Manager plus the publisher recording its events
pub fn create_test_system(
    mode: LobbyMode,
    max_players: usize,
) -> (Arc<LobbyManager>, Arc<MockEventPublisher>) {
    let event_publisher = Arc::new(MockEventPublisher::new());
    let manager = LobbyManager::new(&lobby_config(mode, max_players), event_publisher.clone())
        .expect("metrics registry");
    (Arc::new(manager), event_publisher)
}

/// Router over a fresh manager, with the bot webhook mounted
pub fn create_test_router(mode: LobbyMode, max_players: usize) -> (axum::Router, Arc<LobbyManager>) {
    let (manager, _) = create_test_system(mode, max_players);
    let state = ApiState::new(manager.clone())
        .with_bot(BotHandler::new(manager.clone(), "https://example.com/app"));
    (create_router(state), manager)
}
