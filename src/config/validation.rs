//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{ChatPulseError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_tracker_config(&settings.tracker)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(ChatPulseError::InvalidConfig(
            "Bot token is required".to_string()
        ));
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.snapshot_path.is_empty() {
        return Err(ChatPulseError::InvalidConfig(
            "Snapshot path is required".to_string()
        ));
    }

    Ok(())
}

/// Validate tracker configuration
fn validate_tracker_config(config: &super::TrackerConfig) -> Result<()> {
    if !(-12..=14).contains(&config.utc_offset_hours) {
        return Err(ChatPulseError::InvalidConfig(
            "UTC offset must be between -12 and +14 hours".to_string()
        ));
    }

    if config.sweep_hour > 23 {
        return Err(ChatPulseError::InvalidConfig(
            "Sweep hour must be between 0 and 23".to_string()
        ));
    }

    if config.sweep_minute > 59 {
        return Err(ChatPulseError::InvalidConfig(
            "Sweep minute must be between 0 and 59".to_string()
        ));
    }

    if config.lookup_timeout_seconds == 0 {
        return Err(ChatPulseError::InvalidConfig(
            "Lookup timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ChatPulseError::InvalidConfig(
            "Logging level is required".to_string()
        ));
    }

    Ok(())
}
