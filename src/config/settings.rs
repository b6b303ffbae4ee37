//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub tracker: TrackerConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub admin_ids: Vec<i64>,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub snapshot_path: String,
}

/// Membership tracker configuration
///
/// `utc_offset_hours` anchors day boundaries to a fixed timezone; the sweep
/// fields give the local wall-clock time of the daily snapshot sweep.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    pub utc_offset_hours: i32,
    pub sweep_hour: u32,
    pub sweep_minute: u32,
    pub lookup_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("CHATPULSE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ChatPulseError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
            },
            storage: StorageConfig {
                snapshot_path: "chat_stats.json".to_string(),
            },
            tracker: TrackerConfig {
                utc_offset_hours: 0,
                sweep_hour: 0,
                sweep_minute: 0,
                lookup_timeout_seconds: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}
