//! Chat member update handler
//!
//! Maps Telegram `ChatMemberUpdated` notifications into typed membership
//! transitions and feeds them to the aggregator. Delivery is at-most-once per
//! logical event, but duplicates and reordering are tolerated downstream.

use std::sync::Arc;

use teloxide::types::{ChatMemberKind, ChatMemberUpdated};
use tracing::debug;

use crate::models::{MembershipState, MembershipTransition};
use crate::stats::StatsAggregator;
use crate::utils::errors::Result;

/// Map a Telegram chat-member status onto the tracker's membership state.
pub fn membership_state(kind: &ChatMemberKind) -> MembershipState {
    if kind.is_owner() {
        MembershipState::Owner
    } else if kind.is_administrator() {
        MembershipState::Administrator
    } else if kind.is_member() {
        MembershipState::Member
    } else if kind.is_restricted() {
        MembershipState::Restricted
    } else if kind.is_banned() {
        MembershipState::Banned
    } else {
        MembershipState::Left
    }
}

/// Handle a membership-change notification for a tracked chat.
pub async fn handle_chat_member_updated(
    update: ChatMemberUpdated,
    aggregator: Arc<StatsAggregator>,
) -> Result<()> {
    let transition = MembershipTransition {
        chat_id: update.chat.id.0,
        title: update.chat.title().map(|title| title.to_string()),
        old_state: membership_state(&update.old_chat_member.kind),
        new_state: membership_state(&update.new_chat_member.kind),
    };

    debug!(
        chat_id = transition.chat_id,
        user_id = update.new_chat_member.user.id.0,
        old = ?transition.old_state,
        new = ?transition.new_state,
        "Chat member update received"
    );

    aggregator.apply_transition(transition).await?;
    Ok(())
}
