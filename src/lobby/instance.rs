//! Lobby instance implementation and lifecycle management
//!
//! A [`LobbyInstance`] is the sole authority over one lobby's membership:
//! chat binding, player set, capacity and status transitions. It performs no
//! I/O, so callers can run every operation inside a lock without suspension.

use crate::error::{LobbyError, Result};
use crate::types::{ChatId, LobbyId, LobbySnapshot, LobbyStatus, UserId};
use crate::utils::{current_timestamp, generate_lobby_id};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEffect {
    pub snapshot: LobbySnapshot,
    /// This join filled the lobby and moved it to `playing`
    pub game_started: bool,
}

/// Result of a successful leave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveEffect {
    pub snapshot: LobbySnapshot,
    /// The last player left; the lobby is `finished` and must be retired
    pub finished: bool,
}

/// Membership record for one chat's pending or active game
#[derive(Debug, Clone)]
pub struct LobbyInstance {
    id: LobbyId,
    chat_id: Option<ChatId>,
    players: BTreeSet<UserId>,
    max_players: usize,
    status: LobbyStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LobbyInstance {
    /// Create an unbound lobby; the first join binds it to a chat
    pub fn new(max_players: usize) -> Self {
        let now = current_timestamp();
        Self {
            id: generate_lobby_id(),
            chat_id: None,
            players: BTreeSet::new(),
            max_players: max_players.max(1),
            status: LobbyStatus::Waiting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a lobby already bound to a chat, as `start` does
    pub fn for_chat(chat_id: ChatId, max_players: usize) -> Self {
        let mut lobby = Self::new(max_players);
        lobby.chat_id = Some(chat_id);
        lobby
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.players.contains(&user_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Backdate the last activity (for testing idle cleanup)
    #[cfg(test)]
    pub fn set_updated_at(&mut self, updated_at: DateTime<Utc>) {
        self.updated_at = updated_at;
    }

    fn touch(&mut self) {
        self.updated_at = current_timestamp();
    }

    /// Add a user to the lobby
    ///
    /// Rules are checked in order: an empty lobby adopts the caller's chat,
    /// then chat binding, capacity, in-progress game and duplicate membership.
    /// A rejected join never mutates the lobby.
    pub fn join(&mut self, user_id: UserId, chat_id: ChatId) -> Result<JoinEffect> {
        if self.status == LobbyStatus::Finished {
            return Err(LobbyError::internal(format!(
                "lobby {} is finished and cannot accept players",
                self.id
            )));
        }

        if self.players.is_empty() {
            self.chat_id = Some(chat_id);
        }

        if let Some(bound) = self.chat_id {
            if bound != chat_id {
                return Err(LobbyError::ChatMismatch {
                    bound,
                    requested: chat_id,
                });
            }
        }

        if self.is_full() {
            return Err(LobbyError::Full {
                max_players: self.max_players,
            });
        }

        if self.status == LobbyStatus::Playing {
            return Err(LobbyError::InProgress { chat_id });
        }

        if self.players.contains(&user_id) {
            return Err(LobbyError::AlreadyJoined { user_id });
        }

        self.players.insert(user_id);
        self.touch();

        let game_started = self.is_full();
        if game_started {
            self.status = LobbyStatus::Playing;
        }

        Ok(JoinEffect {
            snapshot: self.snapshot(),
            game_started,
        })
    }

    /// Claim the lobby for `chat_id` without adding a player
    ///
    /// An empty lobby is rebound; an occupied lobby must already belong to
    /// the chat.
    pub fn claim_for_chat(&mut self, chat_id: ChatId) -> Result<()> {
        if self.players.is_empty() {
            self.chat_id = Some(chat_id);
            self.touch();
            return Ok(());
        }

        match self.chat_id {
            Some(bound) if bound != chat_id => Err(LobbyError::ChatMismatch {
                bound,
                requested: chat_id,
            }),
            _ => Ok(()),
        }
    }

    /// Remove a user from the lobby
    ///
    /// When the last player leaves the lobby becomes `finished`.
    pub fn leave(&mut self, user_id: UserId, chat_id: ChatId) -> Result<LeaveEffect> {
        if let Some(bound) = self.chat_id {
            if bound != chat_id {
                return Err(LobbyError::ChatMismatch {
                    bound,
                    requested: chat_id,
                });
            }
        }

        if !self.players.remove(&user_id) {
            return Err(LobbyError::NotInGame { user_id });
        }

        self.touch();

        let finished = self.players.is_empty();
        if finished {
            self.status = LobbyStatus::Finished;
        }

        Ok(LeaveEffect {
            snapshot: self.snapshot(),
            finished,
        })
    }

    /// Whether nobody has joined within `timeout` of the last activity
    pub fn is_idle(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        self.players.is_empty() && now - self.updated_at > timeout
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            lobby_id: Some(self.id),
            chat_id: self.chat_id,
            players: self.players.iter().copied().collect(),
            player_count: self.players.len(),
            max_players: self.max_players,
            is_full: self.is_full(),
            status: Some(self.status),
        }
    }
}
