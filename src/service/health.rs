//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the lobby service,
//! including readiness and liveness probes.

use crate::lobby::LobbyManager;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Numeric value exported by the health status gauge
    pub fn as_gauge(self) -> u8 {
        match self {
            HealthStatus::Unhealthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Healthy => 2,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Everything a health check needs to look at, cheap to clone into handlers
#[derive(Clone)]
pub struct HealthProbe {
    service_name: String,
    lobby_manager: Arc<LobbyManager>,
    is_running: Arc<RwLock<bool>>,
    started_at: DateTime<Utc>,
}

impl HealthProbe {
    pub fn new(
        service_name: impl Into<String>,
        lobby_manager: Arc<LobbyManager>,
        is_running: Arc<RwLock<bool>>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            lobby_manager,
            is_running,
            started_at: Utc::now(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub active_lobbies: usize,
    pub players_waiting: usize,
    pub games_started: u64,
    pub players_joined: u64,
    pub players_left: u64,
    pub lobbies_created: u64,
    pub lobbies_retired: u64,
    pub uptime_seconds: i64,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(probe: &HealthProbe) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(probe).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let lobby_check = Self::check_lobby_manager(probe).await;
        if lobby_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if lobby_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(lobby_check);

        let stats = Self::gather_service_stats(probe).await;

        Ok(HealthCheck {
            status: overall_status,
            service: probe.service_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(probe: &HealthProbe) -> Result<HealthStatus> {
        if probe.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(probe: &HealthProbe) -> Result<HealthStatus> {
        if !probe.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_lobby_manager(probe).await.status)
    }

    async fn check_service_running(probe: &HealthProbe) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if probe.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// A poisoned registry lock makes every lobby operation fail
    async fn check_lobby_manager(probe: &HealthProbe) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match probe.lobby_manager.get_stats().await {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Lobby manager stats check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot access lobby registry: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "lobby_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn gather_service_stats(probe: &HealthProbe) -> ServiceStats {
        let uptime_seconds = probe.uptime_seconds();

        match probe.lobby_manager.get_stats().await {
            Ok(stats) => ServiceStats {
                active_lobbies: stats.active_lobbies,
                players_waiting: stats.players_waiting,
                games_started: stats.games_started,
                players_joined: stats.players_joined,
                players_left: stats.players_left,
                lobbies_created: stats.lobbies_created,
                lobbies_retired: stats.lobbies_retired,
                uptime_seconds,
            },
            Err(e) => {
                debug!("Failed to get lobby stats for health check: {}", e);
                ServiceStats {
                    uptime_seconds,
                    ..ServiceStats::default()
                }
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LobbyConfig;
    use crate::events::TracingEventPublisher;

    fn probe(running: bool) -> HealthProbe {
        let manager = LobbyManager::new(
            &LobbyConfig::default(),
            Arc::new(TracingEventPublisher::new()),
        )
        .unwrap();
        HealthProbe::new(
            "domino-lobby",
            Arc::new(manager),
            Arc::new(RwLock::new(running)),
        )
    }

    #[tokio::test]
    async fn test_running_service_is_healthy() {
        let probe = probe(true);

        let health = HealthCheck::check(&probe).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.service, "domino-lobby");
        assert_eq!(health.checks.len(), 2);

        assert_eq!(
            HealthCheck::liveness_check(&probe).await.unwrap(),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthCheck::readiness_check(&probe).await.unwrap(),
            HealthStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_stopped_service_is_unhealthy() {
        let probe = probe(false);

        let health = HealthCheck::check(&probe).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(
            HealthCheck::readiness_check(&probe).await.unwrap(),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_stats_reflect_lobby_activity() {
        let probe = probe(true);
        probe.lobby_manager.join(1, 100).await.unwrap();
        probe.lobby_manager.join(2, 100).await.unwrap();

        let health = HealthCheck::check(&probe).await.unwrap();
        assert_eq!(health.stats.active_lobbies, 1);
        assert_eq!(health.stats.players_waiting, 2);
        assert_eq!(health.stats.players_joined, 2);
        assert!(health.to_json().unwrap().contains("\"lobby_manager\""));
    }

    #[test]
    fn test_gauge_values() {
        assert_eq!(HealthStatus::Healthy.as_gauge(), 2);
        assert_eq!(HealthStatus::Degraded.as_gauge(), 1);
        assert_eq!(HealthStatus::Unhealthy.as_gauge(), 0);
    }
}
