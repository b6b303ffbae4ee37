//! Chat membership model
//!
//! Defines the per-chat counter aggregate and the canonical classification of
//! membership-status transitions into joins, leaves, and ignored changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Membership status of a user within a chat.
///
/// Mirrors the Telegram chat-member statuses. `Restricted` users may or may
/// not still be in the chat, so transitions involving them are never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipState {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MembershipState {
    /// Whether this status definitely places the user inside (`Some(true)`)
    /// or outside (`Some(false)`) the chat. `None` when ambiguous.
    fn presence(self) -> Option<bool> {
        match self {
            MembershipState::Owner
            | MembershipState::Administrator
            | MembershipState::Member => Some(true),
            MembershipState::Left | MembershipState::Banned => Some(false),
            MembershipState::Restricted => None,
        }
    }
}

/// Outcome of classifying an old/new status pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Join,
    Leave,
    Ignore,
}

impl TransitionKind {
    /// Classify a status pair into exactly one outcome.
    ///
    /// Only a full crossing of the membership boundary counts: `Join` when the
    /// user was out (left/banned) and is now in (member/administrator/owner),
    /// `Leave` for the inverse. Everything else, including promotions like
    /// member -> administrator, is `Ignore`.
    pub fn classify(old: MembershipState, new: MembershipState) -> Self {
        match (old.presence(), new.presence()) {
            (Some(false), Some(true)) => TransitionKind::Join,
            (Some(true), Some(false)) => TransitionKind::Leave,
            _ => TransitionKind::Ignore,
        }
    }
}

/// A membership-change notification delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipTransition {
    pub chat_id: i64,
    /// Chat title as observed on the update, if any.
    pub title: Option<String>,
    pub old_state: MembershipState,
    pub new_state: MembershipState,
}

/// Per-chat counter record.
///
/// The registry key is the chat id; the aggregate itself carries only the
/// fields that are persisted. `joined_today`/`left_today`/`midnight_count`
/// are valid for `last_reset_date` only; any path that touches them while
/// that date is stale must call [`ChatAggregate::rollover_if_stale`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAggregate {
    pub title: String,
    pub midnight_count: Option<i64>,
    pub current_count: i64,
    pub joined_today: u32,
    pub left_today: u32,
    pub last_reset_date: Option<NaiveDate>,
}

impl ChatAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the title when a fresher non-empty value is observed.
    /// Titles are never cleared.
    pub fn observe_title(&mut self, title: &str) {
        if !title.is_empty() {
            self.title = title.to_string();
        }
    }

    /// Whether the daily counters belong to a day other than `today`.
    pub fn needs_rollover(&self, today: NaiveDate) -> bool {
        self.last_reset_date != Some(today)
    }

    /// Reset the daily counters if they are stale, seeding the day with
    /// `seed_count`. Idempotent within a day: returns `true` only when a
    /// reset actually happened.
    pub fn rollover_if_stale(&mut self, today: NaiveDate, seed_count: i64) -> bool {
        if !self.needs_rollover(today) {
            return false;
        }
        self.reset_for_day(today, seed_count);
        true
    }

    /// Unconditionally anchor the aggregate to `today` with an authoritative
    /// (or best-known) member count. Used by the daily sweep.
    pub fn reset_for_day(&mut self, today: NaiveDate, count: i64) {
        let count = count.max(0);
        self.midnight_count = Some(count);
        self.current_count = count;
        self.joined_today = 0;
        self.left_today = 0;
        self.last_reset_date = Some(today);
    }

    /// Record a join. A fresh authoritative count already includes the new
    /// member, so it overwrites `current_count`; without one the counter is
    /// adjusted by one.
    pub fn record_join(&mut self, fresh_count: Option<i64>) {
        self.joined_today += 1;
        self.current_count = match fresh_count {
            Some(count) => count.max(0),
            None => self.current_count + 1,
        };
    }

    /// Record a leave. Clamped at zero so drift can never drive the member
    /// count negative.
    pub fn record_leave(&mut self, fresh_count: Option<i64>) {
        self.left_today += 1;
        self.current_count = match fresh_count {
            Some(count) => count.max(0),
            None => (self.current_count - 1).max(0),
        };
    }
}
