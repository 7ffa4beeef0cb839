//! Session registry mapping chats to lobby instances
//!
//! The registry creates lobbies lazily and forgets them as soon as they are
//! finished. In shared mode every chat resolves to the same key, which
//! reproduces the single process-wide lobby.

use crate::error::{LobbyError, Result};
use crate::lobby::instance::LobbyInstance;
use crate::types::{ChatId, LobbyId, LobbyMode, LobbySnapshot, LobbyStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Key a lobby is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobbyKey {
    /// The single lobby of shared mode
    Shared,
    Chat(ChatId),
}

impl LobbyKey {
    /// Resolve the key for a chat under the given mode
    pub fn resolve(mode: LobbyMode, chat_id: ChatId) -> Self {
        match mode {
            LobbyMode::Shared => LobbyKey::Shared,
            LobbyMode::PerChat => LobbyKey::Chat(chat_id),
        }
    }
}

impl std::fmt::Display for LobbyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyKey::Shared => write!(f, "shared"),
            LobbyKey::Chat(chat_id) => write!(f, "chat:{}", chat_id),
        }
    }
}

/// Result of `start`
#[derive(Debug, Clone)]
pub struct StartEffect {
    pub snapshot: LobbySnapshot,
    /// A new lobby was inserted
    pub created: bool,
    /// A finished lobby was discarded to make room for the new one
    pub replaced: Option<LobbyId>,
}

/// Keyed collection of lobby instances
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    lobbies: HashMap<LobbyKey, LobbyInstance>,
    max_players: usize,
}

impl SessionRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            lobbies: HashMap::new(),
            max_players,
        }
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn get(&self, key: &LobbyKey) -> Option<&LobbyInstance> {
        self.lobbies.get(key)
    }

    pub fn get_mut(&mut self, key: &LobbyKey) -> Option<&mut LobbyInstance> {
        self.lobbies.get_mut(key)
    }

    /// Return the live lobby for `key`, creating one if none exists
    ///
    /// The boolean is `true` when a lobby was created. A finished lobby left
    /// behind is replaced rather than resurrected.
    pub fn get_or_create(&mut self, key: LobbyKey) -> (&mut LobbyInstance, bool) {
        let stale = self
            .lobbies
            .get(&key)
            .map_or(true, |lobby| lobby.status() == LobbyStatus::Finished);

        let max_players = self.max_players;
        if stale {
            self.lobbies.insert(key, LobbyInstance::new(max_players));
        }

        let lobby = self
            .lobbies
            .entry(key)
            .or_insert_with(|| LobbyInstance::new(max_players));
        (lobby, stale)
    }

    /// Open a lobby for `chat_id` under `key`
    pub fn start(&mut self, key: LobbyKey, chat_id: ChatId) -> Result<StartEffect> {
        let mut replaced = None;

        if let Some(existing) = self.lobbies.get_mut(&key) {
            match existing.status() {
                LobbyStatus::Playing => return Err(LobbyError::InProgress { chat_id }),
                LobbyStatus::Waiting => {
                    existing.claim_for_chat(chat_id)?;
                    return Ok(StartEffect {
                        snapshot: existing.snapshot(),
                        created: false,
                        replaced: None,
                    });
                }
                LobbyStatus::Finished => replaced = Some(existing.id()),
            }
        }

        let lobby = LobbyInstance::for_chat(chat_id, self.max_players);
        let snapshot = lobby.snapshot();
        self.lobbies.insert(key, lobby);

        Ok(StartEffect {
            snapshot,
            created: true,
            replaced,
        })
    }

    pub fn remove(&mut self, key: &LobbyKey) -> Option<LobbyInstance> {
        self.lobbies.remove(key)
    }

    /// Remove every empty lobby idle for longer than `timeout`
    pub fn retire_idle(
        &mut self,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> Vec<(LobbyKey, LobbyInstance)> {
        let idle_keys: Vec<LobbyKey> = self
            .lobbies
            .iter()
            .filter(|(_, lobby)| lobby.is_idle(timeout, now))
            .map(|(key, _)| *key)
            .collect();

        idle_keys
            .into_iter()
            .filter_map(|key| self.lobbies.remove(&key).map(|lobby| (key, lobby)))
            .collect()
    }

    /// Number of lobbies currently registered
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }

    /// Total players across all lobbies still waiting for a game
    pub fn players_waiting(&self) -> usize {
        self.lobbies
            .values()
            .filter(|lobby| lobby.status() == LobbyStatus::Waiting)
            .map(|lobby| lobby.player_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;

    #[test]
    fn test_key_resolution() {
        assert_eq!(LobbyKey::resolve(LobbyMode::Shared, 100), LobbyKey::Shared);
        assert_eq!(
            LobbyKey::resolve(LobbyMode::PerChat, 100),
            LobbyKey::Chat(100)
        );
    }

    #[test]
    fn test_get_or_create_is_lazy() {
        let mut registry = SessionRegistry::new(4);
        assert!(registry.is_empty());

        let (lobby, created) = registry.get_or_create(LobbyKey::Chat(100));
        assert!(created);
        let first_id = lobby.id();

        let (lobby, created) = registry.get_or_create(LobbyKey::Chat(100));
        assert!(!created);
        assert_eq!(lobby.id(), first_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_replaces_finished_lobby() {
        let mut registry = SessionRegistry::new(4);
        let (lobby, _) = registry.get_or_create(LobbyKey::Chat(100));
        lobby.join(1, 100).unwrap();
        lobby.leave(1, 100).unwrap();
        let finished_id = lobby.id();

        let (lobby, created) = registry.get_or_create(LobbyKey::Chat(100));
        assert!(created);
        assert_ne!(lobby.id(), finished_id);
        assert_eq!(lobby.status(), LobbyStatus::Waiting);
    }

    #[test]
    fn test_start_creates_bound_lobby() {
        let mut registry = SessionRegistry::new(4);

        let effect = registry.start(LobbyKey::Chat(100), 100).unwrap();
        assert!(effect.created);
        assert_eq!(effect.snapshot.chat_id, Some(100));
        assert_eq!(effect.snapshot.status, Some(LobbyStatus::Waiting));

        let again = registry.start(LobbyKey::Chat(100), 100).unwrap();
        assert!(!again.created);
        assert_eq!(again.snapshot.lobby_id, effect.snapshot.lobby_id);
    }

    #[test]
    fn test_start_rejected_while_playing() {
        let mut registry = SessionRegistry::new(2);
        let key = LobbyKey::Chat(100);
        registry.start(key, 100).unwrap();
        {
            let (lobby, _) = registry.get_or_create(key);
            lobby.join(1, 100).unwrap();
            lobby.join(2, 100).unwrap();
        }

        let err = registry.start(key, 100).unwrap_err();
        assert_eq!(err, LobbyError::InProgress { chat_id: 100 });
    }

    #[test]
    fn test_start_replaces_finished_lobby() {
        let mut registry = SessionRegistry::new(4);
        let key = LobbyKey::Chat(100);
        let old_id = {
            let (lobby, _) = registry.get_or_create(key);
            lobby.join(1, 100).unwrap();
            lobby.leave(1, 100).unwrap();
            lobby.id()
        };

        let effect = registry.start(key, 100).unwrap();
        assert!(effect.created);
        assert_eq!(effect.replaced, Some(old_id));
        assert_ne!(effect.snapshot.lobby_id, Some(old_id));
        assert!(effect.snapshot.players.is_empty());
    }

    #[test]
    fn test_shared_start_from_other_chat_rejected_when_occupied() {
        let mut registry = SessionRegistry::new(4);
        {
            let (lobby, _) = registry.get_or_create(LobbyKey::Shared);
            lobby.join(1, 100).unwrap();
        }

        assert!(matches!(
            registry.start(LobbyKey::Shared, 200),
            Err(LobbyError::ChatMismatch {
                bound: 100,
                requested: 200
            })
        ));
    }

    #[test]
    fn test_retire_idle() {
        let mut registry = SessionRegistry::new(4);
        registry.start(LobbyKey::Chat(100), 100).unwrap();
        {
            let (lobby, _) = registry.get_or_create(LobbyKey::Chat(200));
            lobby.join(1, 200).unwrap();
        }

        let later = current_timestamp() + Duration::hours(1);
        let retired = registry.retire_idle(Duration::minutes(30), later);

        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].0, LobbyKey::Chat(100));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.players_waiting(), 1);
    }
}
