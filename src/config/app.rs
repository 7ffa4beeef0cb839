//! Main application configuration
//!
//! This module defines the primary configuration structures for the lobby
//! service, including environment variable and TOML loading and validation.

use crate::config::lobby::{LobbyConfig, MAX_IDLE_TIMEOUT_SECONDS};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default mini-app location opened by the bot's join button
pub const DEFAULT_WEB_APP_URL: &str = "https://kh4rit.github.io/TelegramDominoMiniApp";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub lobby: LobbyConfig,
    pub bot: BotSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and health reports
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port for the HTTP API
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Idle lobby cleanup interval in seconds
    pub cleanup_interval_seconds: u64,
}

/// Chat-bot settings, passed through to the webhook handler
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Bot credential; the webhook is only mounted when present
    pub token: Option<String>,
    /// Mini-app URL behind the "Join Game" button
    pub web_app_url: String,
    /// Externally reachable base URL of this service
    pub public_base_url: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "domino-lobby".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 3000,
            shutdown_timeout_seconds: 30,
            cleanup_interval_seconds: 60,
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            token: None,
            web_app_url: DEFAULT_WEB_APP_URL.to_string(),
            public_base_url: None,
        }
    }
}

impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("web_app_url", &self.web_app_url)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl BotSettings {
    pub fn is_enabled(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// Full webhook URL to register with the chat platform, if known
    pub fn webhook_url(&self) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|base| format!("{}/bot/webhook", base.trim_end_matches('/')))
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and keys take their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration file")
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(interval) = env::var("CLEANUP_INTERVAL_SECONDS") {
            self.service.cleanup_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid CLEANUP_INTERVAL_SECONDS value: {}", interval))?;
        }

        // Lobby settings
        if let Ok(mode) = env::var("LOBBY_MODE") {
            self.lobby.mode = mode.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Ok(max_players) = env::var("MAX_PLAYERS") {
            self.lobby.max_players = max_players
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_PLAYERS value: {}", max_players))?;
        }
        if let Ok(idle) = env::var("IDLE_TIMEOUT_SECONDS") {
            self.lobby.idle_timeout_seconds = idle
                .parse()
                .map_err(|_| anyhow!("Invalid IDLE_TIMEOUT_SECONDS value: {}", idle))?;
        }

        // Bot settings
        if let Ok(token) = env::var("BOT_TOKEN") {
            self.bot.token = Some(token);
        }
        if let Ok(url) = env::var("WEB_APP_URL") {
            self.bot.web_app_url = url;
        }
        if let Ok(url) = env::var("PUBLIC_BASE_URL") {
            self.bot.public_base_url = Some(url);
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get cleanup interval as Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.service.cleanup_interval_seconds)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.host.is_empty() {
        return Err(anyhow!("Host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.cleanup_interval_seconds == 0 {
        return Err(anyhow!("Cleanup interval must be greater than 0"));
    }

    if config.lobby.max_players == 0 {
        return Err(anyhow!("Max players must be at least 1"));
    }
    if config.lobby.idle_timeout_seconds > MAX_IDLE_TIMEOUT_SECONDS {
        return Err(anyhow!(
            "Idle timeout must be at most {} seconds, got {}",
            MAX_IDLE_TIMEOUT_SECONDS,
            config.lobby.idle_timeout_seconds
        ));
    }

    if config.bot.web_app_url.is_empty() {
        return Err(anyhow!("Web app URL cannot be empty"));
    }

    Ok(())
}
