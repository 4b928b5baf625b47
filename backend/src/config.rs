//! Configuration management for the Laptop Tracking Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Log output format: "pretty" or "json"
    pub log_format: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Photo upload storage
    pub uploads: UploadConfig,

    /// Milestone email outbox
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying JWT tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory photos are written under
    pub root_dir: String,

    /// URL prefix the stored files are served from
    pub public_prefix: String,

    /// Largest accepted photo, in bytes
    pub max_photo_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Queue milestone emails at all
    pub enabled: bool,

    /// Sender address on every email
    pub from_address: String,

    /// Warehouse inbox receiving pre-alerts
    pub warehouse_email: String,

    /// Logistics inbox copied on releases and deliveries
    pub logistics_email: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("LT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("uploads.root_dir", "./uploads")?
            .set_default("uploads.public_prefix", "/uploads")?
            .set_default("uploads.max_photo_bytes", 10 * 1024 * 1024)?
            .set_default("notifications.enabled", true)?
            .set_default("notifications.from_address", "no-reply@laptop-tracking.local")?
            .set_default("notifications.warehouse_email", "warehouse@laptop-tracking.local")?
            .set_default("notifications.logistics_email", "logistics@laptop-tracking.local")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LT_ prefix)
            .add_source(
                Environment::with_prefix("LT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
