//! Chat aggregate registry
//!
//! In-memory mapping of chat id to its counter aggregate. The registry is the
//! single source of truth for membership statistics and is mutated only
//! through the [`crate::stats::StatsAggregator`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ChatAggregate;

/// Registry of all tracked chats, keyed by chat id.
///
/// Serializes transparently as a map from chat-id string to aggregate record,
/// which is exactly the persisted snapshot layout. Iteration order is sorted
/// by chat id, so listings are stable across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatRegistry {
    chats: BTreeMap<i64, ChatAggregate>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the aggregate for a chat, creating it lazily on first reference.
    pub fn ensure(&mut self, chat_id: i64) -> &mut ChatAggregate {
        self.chats.entry(chat_id).or_default()
    }

    pub fn get(&self, chat_id: i64) -> Option<&ChatAggregate> {
        self.chats.get(&chat_id)
    }

    pub fn get_mut(&mut self, chat_id: i64) -> Option<&mut ChatAggregate> {
        self.chats.get_mut(&chat_id)
    }

    /// All known chat ids, in iteration order.
    pub fn chat_ids(&self) -> Vec<i64> {
        self.chats.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &ChatAggregate)> {
        self.chats.iter().map(|(id, aggregate)| (*id, aggregate))
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }
}
