//! Configuration management for the lobby service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod lobby;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, BotSettings, ServiceSettings};
pub use lobby::LobbyConfig;
