//! Error handling for ChatPulse
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.
//!
//! Note that a failed authoritative member-count lookup is deliberately not an
//! error: lookup outcomes are modelled as [`crate::services::CountLookup`] and
//! consumed by the aggregator's fallback logic.

use thiserror::Error;

/// Main error type for the ChatPulse application
#[derive(Error, Debug)]
pub enum ChatPulseError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Chat not found: {chat_id}")]
    ChatNotFound { chat_id: i64 },

    #[error("No chats are being tracked yet")]
    NoData,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ChatPulse operations
pub type Result<T> = std::result::Result<T, ChatPulseError>;

impl ChatPulseError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChatPulseError::Telegram(_) => true,
            ChatPulseError::Config(_) => false,
            ChatPulseError::InvalidConfig(_) => false,
            ChatPulseError::ChatNotFound { .. } => false,
            ChatPulseError::NoData => false,
            ChatPulseError::Serialization(_) => false,
            ChatPulseError::Io(_) => true,
        }
    }
}
