//! Metrics and monitoring for the lobby service
//!
//! Prometheus collectors updated by the lobby manager and exposed on
//! `/metrics` by the HTTP server.

pub mod collector;

pub use collector::{LobbyMetrics, MetricsCollector, MetricsTimer, OperationMetrics, ServiceMetrics};
