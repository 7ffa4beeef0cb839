//! HTTP API server
//!
//! One axum router serves the mini-app lobby endpoints, the chat-bot
//! webhook and the health and Prometheus endpoints.

pub mod bot;
pub mod health;
pub mod lobby;
pub mod response;

use crate::bot::BotHandler;
use crate::lobby::LobbyManager;
use crate::metrics::MetricsCollector;
use crate::service::health::HealthProbe;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use response::{ApiError, ApiResponse, GameStateData, MembershipData};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for every handler
#[derive(Clone)]
pub struct ApiState {
    pub lobby_manager: Arc<LobbyManager>,
    pub metrics_collector: Arc<MetricsCollector>,
    /// Mounted at `/bot/webhook` when present
    pub bot: Option<BotHandler>,
    /// Absent until the service is wired up
    pub health: Option<HealthProbe>,
}

impl ApiState {
    pub fn new(lobby_manager: Arc<LobbyManager>) -> Self {
        let metrics_collector = lobby_manager.metrics();
        Self {
            lobby_manager,
            metrics_collector,
            bot: None,
            health: None,
        }
    }

    pub fn with_bot(mut self, bot: BotHandler) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn with_health(mut self, probe: HealthProbe) -> Self {
        self.health = Some(probe);
        self
    }

    pub fn service_name(&self) -> &str {
        self.health
            .as_ref()
            .map(HealthProbe::service_name)
            .unwrap_or(env!("CARGO_PKG_NAME"))
    }
}

/// Build the router with all endpoints
pub fn create_router(state: ApiState) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .route("/alive", get(health::alive_handler))
        .route("/metrics", get(health::metrics_handler))
        .route("/stats", get(health::stats_handler))
        .route("/api/join", post(lobby::join_handler))
        .route("/api/leave", post(lobby::leave_handler))
        .route("/api/game-state", get(lobby::game_state_handler));

    if state.bot.is_some() {
        router = router.route("/bot/webhook", post(bot::webhook_handler));
    }

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// HTTP server with broadcast-driven graceful shutdown
pub struct HttpServer {
    config: HttpServerConfig,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: ApiState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`HttpServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = create_router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("HTTP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await
            .context("HTTP server failed")?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub fn stop(&self) {
        info!("Stopping HTTP server...");
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LobbyConfig;
    use crate::events::TracingEventPublisher;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn state() -> ApiState {
        let manager = LobbyManager::new(
            &LobbyConfig::default(),
            Arc::new(TracingEventPublisher::new()),
        )
        .unwrap();
        ApiState::new(Arc::new(manager))
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["mode"], "shared");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = state();
        state.lobby_manager.join(1, 100).await.unwrap();

        let response = create_router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("domino_lobby_operations_total"));
    }

    #[tokio::test]
    async fn test_health_endpoints_without_probe() {
        for uri in ["/health", "/ready", "/alive", "/stats"] {
            let response = create_router(state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_webhook_not_mounted_without_bot() {
        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/bot/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"update_id":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
