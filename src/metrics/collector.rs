//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the lobby service using
//! Prometheus metrics.

use crate::types::RetireReason;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the lobby service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Lobby lifecycle metrics
    lobby_metrics: LobbyMetrics,

    /// Per-operation metrics
    operation_metrics: OperationMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Lobby lifecycle metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Number of lobbies currently registered
    pub active_lobbies: IntGauge,

    /// Total lobbies created
    pub lobbies_created_total: IntCounter,

    /// Total lobbies retired, by reason
    pub lobbies_retired_total: IntCounterVec,

    /// Total lobbies that reached capacity
    pub games_started_total: IntCounter,

    /// Players sitting in waiting lobbies
    pub players_waiting: IntGauge,
}

/// Per-operation metrics
#[derive(Clone)]
pub struct OperationMetrics {
    /// Lobby operations by name and outcome
    pub operations_total: IntCounterVec,

    /// Lobby operation durations
    pub operation_duration: HistogramVec,

    /// Bot webhook handling time
    pub webhook_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;
        let operation_metrics = OperationMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            lobby_metrics,
            operation_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    pub fn operations(&self) -> &OperationMetrics {
        &self.operation_metrics
    }

    /// Record the outcome and duration of a lobby operation
    pub fn record_operation(&self, operation: &str, outcome: &str, duration: Duration) {
        self.operation_metrics
            .operations_total
            .with_label_values(&[operation, outcome])
            .inc();

        self.operation_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    pub fn record_lobby_created(&self) {
        self.lobby_metrics.lobbies_created_total.inc();
    }

    pub fn record_lobby_retired(&self, reason: RetireReason) {
        let reason_str = match reason {
            RetireReason::Emptied => "emptied",
            RetireReason::Idle => "idle",
            RetireReason::Replaced => "replaced",
        };

        self.lobby_metrics
            .lobbies_retired_total
            .with_label_values(&[reason_str])
            .inc();
    }

    pub fn record_game_started(&self) {
        self.lobby_metrics.games_started_total.inc();
    }

    /// Refresh the registry-wide gauges
    pub fn update_lobby_gauges(&self, active_lobbies: usize, players_waiting: usize) {
        self.lobby_metrics.active_lobbies.set(active_lobbies as i64);
        self.lobby_metrics
            .players_waiting
            .set(players_waiting as i64);
    }

    pub fn record_webhook(&self, duration: Duration) {
        self.operation_metrics
            .webhook_duration
            .observe(duration.as_secs_f64());
    }

    /// Update overall health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(if healthy { 1 } else { 0 });
    }

    /// Start a timer for measuring an operation
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer {
            start: Instant::now(),
        }
    }
}

/// Simple timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("domino_lobby_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "domino_lobby_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("domino_lobby_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_lobbies =
            IntGauge::new("domino_lobby_active_lobbies", "Number of registered lobbies")?;
        registry.register(Box::new(active_lobbies.clone()))?;

        let lobbies_created_total = IntCounter::new(
            "domino_lobby_lobbies_created_total",
            "Total number of lobbies created",
        )?;
        registry.register(Box::new(lobbies_created_total.clone()))?;

        let lobbies_retired_total = IntCounterVec::new(
            Opts::new(
                "domino_lobby_lobbies_retired_total",
                "Total number of lobbies retired",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(lobbies_retired_total.clone()))?;

        let games_started_total = IntCounter::new(
            "domino_lobby_games_started_total",
            "Total number of lobbies that filled up",
        )?;
        registry.register(Box::new(games_started_total.clone()))?;

        let players_waiting = IntGauge::new(
            "domino_lobby_players_waiting",
            "Players in lobbies that are still waiting",
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        Ok(Self {
            active_lobbies,
            lobbies_created_total,
            lobbies_retired_total,
            games_started_total,
            players_waiting,
        })
    }
}

impl OperationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operations_total = IntCounterVec::new(
            Opts::new(
                "domino_lobby_operations_total",
                "Lobby operations by name and outcome",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "domino_lobby_operation_duration_seconds",
                "Lobby operation duration",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let webhook_duration = Histogram::with_opts(
            HistogramOpts::new(
                "domino_lobby_webhook_duration_seconds",
                "Bot webhook handling duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(webhook_duration.clone()))?;

        Ok(Self {
            operations_total,
            operation_duration,
            webhook_duration,
        })
    }
}
