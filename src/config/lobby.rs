//! Lobby configuration

use crate::types::LobbyMode;
use serde::{Deserialize, Serialize};

/// Default capacity of a domino table
pub const DEFAULT_MAX_PLAYERS: usize = 4;

/// Longest accepted idle timeout (one week)
pub const MAX_IDLE_TIMEOUT_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Lobby behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Shared single lobby or one lobby per chat
    pub mode: LobbyMode,
    /// Capacity of every lobby
    pub max_players: usize,
    /// Empty lobbies idle for longer than this are retired
    pub idle_timeout_seconds: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            mode: LobbyMode::Shared,
            max_players: DEFAULT_MAX_PLAYERS,
            idle_timeout_seconds: 1800, // 30 minutes
        }
    }
}

impl LobbyConfig {
    /// Idle timeout as a chrono duration, clamped to `MAX_IDLE_TIMEOUT_SECONDS`
    pub fn idle_timeout(&self) -> chrono::Duration {
        let seconds = self.idle_timeout_seconds.min(MAX_IDLE_TIMEOUT_SECONDS);
        chrono::Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_timeout_conversion() {
        let config = LobbyConfig::default();
        assert_eq!(config.idle_timeout(), chrono::Duration::minutes(30));
    }

    #[test]
    fn test_idle_timeout_is_clamped() {
        for seconds in [10_000_000_000_000_000, u64::MAX] {
            let config = LobbyConfig {
                idle_timeout_seconds: seconds,
                ..LobbyConfig::default()
            };
            assert_eq!(
                config.idle_timeout(),
                chrono::Duration::seconds(MAX_IDLE_TIMEOUT_SECONDS as i64)
            );
        }
    }
}
