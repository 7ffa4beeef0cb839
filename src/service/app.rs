//! Main application state and service coordination
//!
//! This module contains the production AppState that owns the lobby manager,
//! the HTTP server and the background maintenance tasks.

use crate::api::{ApiState, HttpServer, HttpServerConfig};
use crate::bot::BotHandler;
use crate::config::{validate_config, AppConfig};
use crate::events::TracingEventPublisher;
use crate::lobby::LobbyManager;
use crate::metrics::MetricsCollector;
use crate::service::health::{HealthCheck, HealthProbe};
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The single owner of all lobby state
    lobby_manager: Arc<LobbyManager>,

    /// Prometheus metrics shared with the lobby manager
    metrics_collector: Arc<MetricsCollector>,

    /// HTTP API, webhook and health endpoints
    http_server: Arc<HttpServer>,

    /// Running HTTP server task
    http_task: Option<JoinHandle<()>>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// Shared with the health endpoints
    health_probe: HealthProbe,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing domino lobby service");
        info!(
            "Configuration: service={}, mode={}, max_players={}, bot={}",
            config.service.name,
            config.lobby.mode,
            config.lobby.max_players,
            if config.bot.is_enabled() { "enabled" } else { "disabled" }
        );

        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let lobby_manager = Arc::new(LobbyManager::with_metrics(
            &config.lobby,
            Arc::new(TracingEventPublisher::new()),
            metrics_collector.clone(),
        ));

        let is_running = Arc::new(RwLock::new(false));
        let probe = HealthProbe::new(
            config.service.name.clone(),
            lobby_manager.clone(),
            is_running.clone(),
        );

        let mut api_state = ApiState::new(lobby_manager.clone()).with_health(probe.clone());
        if config.bot.is_enabled() {
            api_state = api_state.with_bot(BotHandler::new(
                lobby_manager.clone(),
                config.bot.web_app_url.clone(),
            ));
        }

        let http_config = HttpServerConfig {
            port: config.service.http_port,
            host: config.service.host.clone(),
        };
        let http_server = Arc::new(HttpServer::new(http_config, api_state));

        Ok(Self {
            config,
            lobby_manager,
            metrics_collector,
            http_server,
            http_task: None,
            background_tasks: Vec::new(),
            is_running,
            health_probe: probe,
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting domino lobby service");

        *self.is_running.write().await = true;

        self.start_http_server().await?;
        self.start_background_tasks().await?;

        info!("✅ Domino lobby service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of domino lobby service");

        *self.is_running.write().await = false;

        // Drain in-flight requests before tearing down the rest
        self.http_server.stop();
        if let Some(task) = self.http_task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout(), task).await {
                Ok(_) => info!("✅ HTTP server stopped"),
                Err(_) => warn!(
                    "HTTP server did not stop within {}s",
                    self.config.shutdown_timeout().as_secs()
                ),
            }
        }

        self.stop_background_tasks().await;

        let final_stats =
            self.lobby_manager
                .get_stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ Domino lobby service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get lobby manager for operations
    pub fn lobby_manager(&self) -> Arc<LobbyManager> {
        self.lobby_manager.clone()
    }

    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Probe used by the health endpoints
    pub fn health_probe(&self) -> HealthProbe {
        self.health_probe.clone()
    }

    async fn start_http_server(&mut self) -> Result<(), ServiceError> {
        info!("Starting HTTP server on {}", self.config.bind_address());

        let http_server = self.http_server.clone();
        let is_running = self.is_running.clone();

        self.http_task = Some(tokio::spawn(async move {
            if let Err(e) = http_server.start().await {
                error!("HTTP server failed: {:#}", e);
                *is_running.write().await = false;
            } else {
                info!("HTTP server task completed");
            }
        }));

        // Give the server a moment to bind
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        if !*self.is_running.read().await {
            return Err(ServiceError::Initialization {
                message: format!("HTTP server failed to start on {}", self.config.bind_address()),
            });
        }

        info!("✅ HTTP server started on {}", self.config.bind_address());
        Ok(())
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&mut self) -> Result<(), ServiceError> {
        info!("Starting background maintenance tasks...");

        info!(
            "Starting idle lobby cleanup task ({}s interval)...",
            self.config.cleanup_interval().as_secs()
        );
        let cleanup_task = {
            let lobby_manager = self.lobby_manager.clone();
            let cleanup_interval = self.config.cleanup_interval();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                info!("Lobby cleanup task started");

                while *is_running.read().await {
                    interval.tick().await;

                    match lobby_manager.cleanup_idle_lobbies().await {
                        Ok(retired) => {
                            if retired > 0 {
                                info!("Retired {} idle lobbies", retired);
                            } else {
                                debug!("Cleanup check completed - no idle lobbies found");
                            }
                        }
                        Err(e) => {
                            warn!("Lobby cleanup failed: {}", e);
                        }
                    }
                }

                info!("Lobby cleanup task stopped");
            })
        };

        info!("Starting health metrics task (60s interval)...");
        let health_metrics_task = {
            let metrics_collector = self.metrics_collector.clone();
            let probe = self.health_probe();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                info!("Health metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(probe.uptime_seconds());

                    match HealthCheck::check(&probe).await {
                        Ok(health) => {
                            metrics_collector.update_health_status(health.status.as_gauge());
                            for check in &health.checks {
                                metrics_collector.update_component_health(
                                    &check.name,
                                    check.status.as_gauge() > 0,
                                );
                            }
                            debug!(
                                "Updated service health metrics - status: {}, uptime: {}s",
                                health.status, health.stats.uptime_seconds
                            );
                        }
                        Err(e) => {
                            warn!("Health check for metrics failed: {}", e);
                        }
                    }
                }

                info!("Health metrics task stopped");
            })
        };

        self.background_tasks.push(cleanup_task);
        self.background_tasks.push(health_metrics_task);

        info!(
            "{} background maintenance tasks started successfully",
            self.background_tasks.len()
        );
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
