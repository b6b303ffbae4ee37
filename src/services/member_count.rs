//! Authoritative member-count lookup
//!
//! The aggregator corrects counter drift against the platform's own member
//! count. Lookups can fail or time out; that outcome is an explicit value, not
//! an error, because every caller has a fallback path.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::requests::Request;
use tracing::warn;

/// Outcome of an authoritative member-count lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountLookup {
    /// The platform answered with a fresh total.
    Fresh(i64),
    /// The lookup failed or timed out; callers fall back to the last known count.
    Unavailable,
}

impl CountLookup {
    /// The fresh count, or `fallback` when the lookup failed.
    pub fn or_fallback(self, fallback: i64) -> i64 {
        match self {
            CountLookup::Fresh(count) => count,
            CountLookup::Unavailable => fallback,
        }
    }

    pub fn fresh_count(self) -> Option<i64> {
        match self {
            CountLookup::Fresh(count) => Some(count),
            CountLookup::Unavailable => None,
        }
    }
}

/// On-demand member-count lookup against the messaging platform.
#[async_trait]
pub trait MemberCountProvider: Send + Sync {
    async fn member_count(&self, chat_id: i64) -> CountLookup;
}

/// Member-count provider backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramMemberCount {
    bot: Bot,
    timeout: Duration,
}

impl TelegramMemberCount {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

#[async_trait]
impl MemberCountProvider for TelegramMemberCount {
    async fn member_count(&self, chat_id: i64) -> CountLookup {
        let request = self.bot.get_chat_member_count(ChatId(chat_id));
        match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(count)) => CountLookup::Fresh(i64::from(count)),
            Ok(Err(e)) => {
                warn!(chat_id = chat_id, error = %e, "Member count lookup failed");
                CountLookup::Unavailable
            }
            Err(_) => {
                warn!(
                    chat_id = chat_id,
                    timeout_seconds = self.timeout.as_secs(),
                    "Member count lookup timed out"
                );
                CountLookup::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fallback() {
        assert_eq!(CountLookup::Fresh(7).or_fallback(3), 7);
        assert_eq!(CountLookup::Unavailable.or_fallback(3), 3);
    }

    #[test]
    fn test_fresh_count() {
        assert_eq!(CountLookup::Fresh(7).fresh_count(), Some(7));
        assert_eq!(CountLookup::Unavailable.fresh_count(), None);
    }
}
