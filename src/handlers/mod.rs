//! Handlers module
//!
//! This module contains the Telegram update handlers: membership-change
//! notifications and report commands.

pub mod chat_member;
pub mod commands;

pub use chat_member::handle_chat_member_updated;
pub use commands::Command;
