//! Services module
//!
//! This module contains external collaborators of the aggregation core.

pub mod member_count;

pub use member_count::{CountLookup, MemberCountProvider, TelegramMemberCount};
