//! Lobby manager: the synchronized facade over the session registry
//!
//! Every transport (HTTP API, bot webhook) goes through [`LobbyManager`].
//! Each mutation runs to completion under one write guard on the registry,
//! which keeps the capacity and uniqueness invariants intact under a
//! multi-threaded runtime. Events are published after the guard is dropped.

use crate::config::LobbyConfig;
use crate::error::{LobbyError, Result};
use crate::events::EventPublisher;
use crate::lobby::instance::{JoinEffect, LeaveEffect, LobbyInstance};
use crate::lobby::registry::{LobbyKey, SessionRegistry, StartEffect};
use crate::metrics::MetricsCollector;
use crate::types::{
    ChatId, GameStarting, LobbyEvent, LobbyMode, LobbyRetired, LobbySnapshot, PlayerJoinedLobby,
    PlayerLeftLobby, RetireReason, UserId,
};
use crate::utils::current_timestamp;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Statistics about lobby manager operations
#[derive(Debug, Clone, Default)]
pub struct LobbyManagerStats {
    /// Total number of lobbies created
    pub lobbies_created: u64,
    /// Total number of lobbies retired
    pub lobbies_retired: u64,
    /// Total number of successful joins
    pub players_joined: u64,
    /// Total number of successful leaves
    pub players_left: u64,
    /// Total number of lobbies that filled up
    pub games_started: u64,
    /// Current number of registered lobbies
    pub active_lobbies: usize,
    /// Current number of players in waiting lobbies
    pub players_waiting: usize,
}

/// The main lobby manager
#[derive(Clone)]
pub struct LobbyManager {
    /// Lobbies keyed by chat (or the single shared key)
    registry: Arc<RwLock<SessionRegistry>>,
    /// Shared single lobby or one per chat
    mode: LobbyMode,
    /// Empty lobbies idle for longer than this are retired
    idle_timeout: chrono::Duration,
    /// Event publisher for lobby events
    event_publisher: Arc<dyn EventPublisher>,
    /// Manager statistics
    stats: Arc<RwLock<LobbyManagerStats>>,
    /// Metrics collector for recording operation data
    metrics_collector: Arc<MetricsCollector>,
}

impl LobbyManager {
    /// Create a new lobby manager with its own metrics registry
    pub fn new(
        config: &LobbyConfig,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> anyhow::Result<Self> {
        let metrics_collector = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_metrics(config, event_publisher, metrics_collector))
    }

    /// Create a new lobby manager reporting into an existing metrics collector
    pub fn with_metrics(
        config: &LobbyConfig,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            registry: Arc::new(RwLock::new(SessionRegistry::new(config.max_players))),
            mode: config.mode,
            idle_timeout: config.idle_timeout(),
            event_publisher,
            stats: Arc::new(RwLock::new(LobbyManagerStats::default())),
            metrics_collector,
        }
    }

    pub fn mode(&self) -> LobbyMode {
        self.mode
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Capacity applied to every lobby
    pub fn max_players(&self) -> Result<usize> {
        Ok(self.read_registry()?.max_players())
    }

    /// Add `user_id` to the lobby serving `chat_id`
    pub async fn join(&self, user_id: UserId, chat_id: ChatId) -> Result<LobbySnapshot> {
        let timer = self.metrics_collector.start_timer();
        let key = LobbyKey::resolve(self.mode, chat_id);

        let result = self.apply_join(key, user_id, chat_id);
        self.metrics_collector
            .record_operation("join", outcome_label(&result), timer.stop());

        let effect = match result {
            Ok(effect) => effect,
            Err(e) => {
                warn!(
                    "Join rejected - user: {}, chat: {}, lobby: {}, reason: {}",
                    user_id, chat_id, key, e
                );
                return Err(e);
            }
        };

        let snapshot = effect.snapshot;
        info!(
            "Player {} joined lobby {} - players: {}/{}, full: {}",
            user_id, key, snapshot.player_count, snapshot.max_players, snapshot.is_full
        );

        if let Some(lobby_id) = snapshot.lobby_id {
            let mut events = vec![LobbyEvent::PlayerJoinedLobby(PlayerJoinedLobby {
                lobby_id,
                chat_id,
                user_id,
                current_players: snapshot.players.clone(),
                timestamp: current_timestamp(),
            })];

            if effect.game_started {
                info!("Lobby {} is full, game starting", key);
                events.push(LobbyEvent::GameStarting(GameStarting {
                    lobby_id,
                    chat_id,
                    players: snapshot.players.clone(),
                    timestamp: current_timestamp(),
                }));
            }

            self.publish_all(events).await;
        }

        Ok(snapshot)
    }

    fn apply_join(&self, key: LobbyKey, user_id: UserId, chat_id: ChatId) -> Result<JoinEffect> {
        let mut registry = self.write_registry()?;

        let (lobby, created) = registry.get_or_create(key);
        let result = lobby.join(user_id, chat_id);

        match &result {
            Ok(effect) => {
                let mut stats = self.write_stats()?;
                stats.players_joined += 1;
                if created {
                    stats.lobbies_created += 1;
                    self.metrics_collector.record_lobby_created();
                }
                if effect.game_started {
                    stats.games_started += 1;
                    self.metrics_collector.record_game_started();
                }
            }
            Err(_) if created => {
                registry.remove(&key);
            }
            Err(_) => {}
        }

        self.refresh_gauges(&registry);
        result
    }

    /// Remove `user_id` from the lobby serving `chat_id`
    ///
    /// The lobby is retired from the registry when its last player leaves.
    pub async fn leave(&self, user_id: UserId, chat_id: ChatId) -> Result<LobbySnapshot> {
        let timer = self.metrics_collector.start_timer();
        let key = LobbyKey::resolve(self.mode, chat_id);

        let result = self.apply_leave(key, user_id, chat_id);
        self.metrics_collector
            .record_operation("leave", outcome_label(&result), timer.stop());

        let (effect, retired) = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    "Leave rejected - user: {}, chat: {}, lobby: {}, reason: {}",
                    user_id, chat_id, key, e
                );
                return Err(e);
            }
        };

        let snapshot = effect.snapshot;
        info!(
            "Player {} left lobby {} - players: {}/{}",
            user_id, key, snapshot.player_count, snapshot.max_players
        );

        let mut events = Vec::new();
        if let Some(lobby_id) = snapshot.lobby_id {
            events.push(LobbyEvent::PlayerLeftLobby(PlayerLeftLobby {
                lobby_id,
                chat_id,
                user_id,
                remaining_players: snapshot.players.clone(),
                timestamp: current_timestamp(),
            }));
        }
        if let Some(lobby) = retired {
            info!("Lobby {} finished and retired", key);
            events.push(retired_event(&lobby, RetireReason::Emptied));
        }
        self.publish_all(events).await;

        Ok(snapshot)
    }

    fn apply_leave(
        &self,
        key: LobbyKey,
        user_id: UserId,
        chat_id: ChatId,
    ) -> Result<(LeaveEffect, Option<LobbyInstance>)> {
        let mut registry = self.write_registry()?;

        let lobby = registry
            .get_mut(&key)
            .ok_or(LobbyError::NotInGame { user_id })?;
        let effect = lobby.leave(user_id, chat_id)?;

        let retired = if effect.finished {
            registry.remove(&key)
        } else {
            None
        };

        {
            let mut stats = self.write_stats()?;
            stats.players_left += 1;
            if retired.is_some() {
                stats.lobbies_retired += 1;
                self.metrics_collector
                    .record_lobby_retired(RetireReason::Emptied);
            }
        }

        self.refresh_gauges(&registry);
        Ok((effect, retired))
    }

    /// Open a lobby for `chat_id`, or return the one already waiting
    pub async fn start(&self, chat_id: ChatId) -> Result<LobbySnapshot> {
        let timer = self.metrics_collector.start_timer();
        let key = LobbyKey::resolve(self.mode, chat_id);

        let result = self.apply_start(key, chat_id);
        self.metrics_collector
            .record_operation("start", outcome_label(&result), timer.stop());

        let effect = match result {
            Ok(effect) => effect,
            Err(e) => {
                warn!("Start rejected - chat: {}, lobby: {}, reason: {}", chat_id, key, e);
                return Err(e);
            }
        };

        if let Some(replaced) = effect.replaced {
            self.publish_all(vec![LobbyEvent::LobbyRetired(LobbyRetired {
                lobby_id: replaced,
                chat_id: Some(chat_id),
                reason: RetireReason::Replaced,
                timestamp: current_timestamp(),
            })])
            .await;
        }

        if effect.created {
            info!("Started new lobby {} for chat {}", key, chat_id);
        } else {
            debug!("Lobby {} already open for chat {}", key, chat_id);
        }

        Ok(effect.snapshot)
    }

    fn apply_start(&self, key: LobbyKey, chat_id: ChatId) -> Result<StartEffect> {
        let mut registry = self.write_registry()?;
        let effect = registry.start(key, chat_id)?;

        {
            let mut stats = self.write_stats()?;
            if effect.created {
                stats.lobbies_created += 1;
                self.metrics_collector.record_lobby_created();
            }
            if effect.replaced.is_some() {
                stats.lobbies_retired += 1;
                self.metrics_collector
                    .record_lobby_retired(RetireReason::Replaced);
            }
        }

        self.refresh_gauges(&registry);
        Ok(effect)
    }

    /// Read-only snapshot of the lobby serving `chat_id`
    ///
    /// In shared mode the chat is ignored. In per-chat mode an unknown or
    /// absent chat yields the empty snapshot rather than an error.
    pub fn status(&self, chat_id: Option<ChatId>) -> Result<LobbySnapshot> {
        let registry = self.read_registry()?;

        let key = match (self.mode, chat_id) {
            (LobbyMode::Shared, _) => LobbyKey::Shared,
            (LobbyMode::PerChat, Some(chat_id)) => LobbyKey::Chat(chat_id),
            (LobbyMode::PerChat, None) => {
                return Ok(LobbySnapshot::empty(registry.max_players()));
            }
        };

        let snapshot = registry
            .get(&key)
            .map(LobbyInstance::snapshot)
            .unwrap_or_else(|| LobbySnapshot::empty(registry.max_players()));

        debug!(
            "Status for lobby {} - players: {}/{}",
            key, snapshot.player_count, snapshot.max_players
        );
        Ok(snapshot)
    }

    /// Retire empty lobbies that nobody joined within the idle timeout
    pub async fn cleanup_idle_lobbies(&self) -> Result<usize> {
        let retired = {
            let mut registry = self.write_registry()?;
            let retired = registry.retire_idle(self.idle_timeout, current_timestamp());

            if !retired.is_empty() {
                let mut stats = self.write_stats()?;
                stats.lobbies_retired += retired.len() as u64;
                for _ in &retired {
                    self.metrics_collector.record_lobby_retired(RetireReason::Idle);
                }
            }

            self.refresh_gauges(&registry);
            retired
        };

        let count = retired.len();
        let events = retired
            .iter()
            .map(|(key, lobby)| {
                debug!("Retired idle lobby {}", key);
                retired_event(lobby, RetireReason::Idle)
            })
            .collect();
        self.publish_all(events).await;

        Ok(count)
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> Result<LobbyManagerStats> {
        let (active_lobbies, players_waiting) = {
            let registry = self.read_registry()?;
            (registry.len(), registry.players_waiting())
        };

        let mut stats = self
            .stats
            .read()
            .map_err(|_| LobbyError::internal("Failed to acquire stats lock"))?
            .clone();
        stats.active_lobbies = active_lobbies;
        stats.players_waiting = players_waiting;

        Ok(stats)
    }

    async fn publish_all(&self, events: Vec<LobbyEvent>) {
        for event in events {
            if let Err(e) = self.event_publisher.publish(event).await {
                warn!("Failed to publish lobby event: {}", e);
            }
        }
    }

    fn refresh_gauges(&self, registry: &SessionRegistry) {
        self.metrics_collector
            .update_lobby_gauges(registry.len(), registry.players_waiting());
    }

    fn read_registry(&self) -> Result<RwLockReadGuard<'_, SessionRegistry>> {
        self.registry
            .read()
            .map_err(|_| LobbyError::internal("Failed to acquire lobbies lock"))
    }

    fn write_registry(&self) -> Result<RwLockWriteGuard<'_, SessionRegistry>> {
        self.registry
            .write()
            .map_err(|_| LobbyError::internal("Failed to acquire lobbies lock"))
    }

    fn write_stats(&self) -> Result<RwLockWriteGuard<'_, LobbyManagerStats>> {
        self.stats
            .write()
            .map_err(|_| LobbyError::internal("Failed to acquire stats lock"))
    }
}

fn retired_event(lobby: &LobbyInstance, reason: RetireReason) -> LobbyEvent {
    LobbyEvent::LobbyRetired(LobbyRetired {
        lobby_id: lobby.id(),
        chat_id: lobby.chat_id(),
        reason,
        timestamp: current_timestamp(),
    })
}

/// Metric label for an operation result
fn outcome_label<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(LobbyError::Validation { .. }) => "invalid",
        Err(LobbyError::ChatMismatch { .. }) => "chat_mismatch",
        Err(LobbyError::Full { .. }) => "full",
        Err(LobbyError::AlreadyJoined { .. }) => "already_joined",
        Err(LobbyError::NotInGame { .. }) => "not_in_game",
        Err(LobbyError::InProgress { .. }) => "in_progress",
        Err(LobbyError::Internal { .. }) => "internal",
    }
}
