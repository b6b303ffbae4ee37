//! Utilities module
//!
//! This module contains error types and logging setup shared across the application.

pub mod errors;
pub mod logging;

pub use errors::{ChatPulseError, Result};
