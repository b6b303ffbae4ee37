//! ChatPulse Telegram Bot
//!
//! A Telegram bot that tracks membership churn in group chats. This library
//! provides the stateful aggregation core (per-chat join/leave counters with
//! day-boundary resets and drift correction against authoritative member
//! counts), a durable snapshot store, and the bot wiring that feeds
//! membership-change notifications into the core.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod stats;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ChatPulseError, Result};

// Re-export main components for easy access
pub use stats::{ChatRegistry, ReportService, StatsAggregator};
pub use storage::{JsonSnapshotStore, SnapshotStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
