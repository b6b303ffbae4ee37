//! Report queries
//!
//! Read-only projections of chat aggregates. Rollover writes triggered by a
//! stale read go through the aggregator, so queries share the same
//! serialization discipline as the write path.

use std::sync::Arc;

use crate::models::ChatAggregate;
use crate::stats::aggregator::StatsAggregator;
use crate::utils::errors::Result;

/// Point-in-time view of one chat's membership counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReport {
    pub chat_id: i64,
    pub title: String,
    /// `None` until a day boundary has first been established for the chat.
    pub midnight_count: Option<i64>,
    pub current_count: i64,
    pub joined_today: u32,
    pub left_today: u32,
}

impl ChatReport {
    pub(crate) fn from_aggregate(chat_id: i64, aggregate: &ChatAggregate) -> Self {
        Self {
            chat_id,
            title: aggregate.title.clone(),
            midnight_count: aggregate.midnight_count,
            current_count: aggregate.current_count,
            joined_today: aggregate.joined_today,
            left_today: aggregate.left_today,
        }
    }
}

/// Query service over the chat registry.
#[derive(Clone)]
pub struct ReportService {
    aggregator: Arc<StatsAggregator>,
}

impl ReportService {
    pub fn new(aggregator: Arc<StatsAggregator>) -> Self {
        Self { aggregator }
    }

    /// Report for a single chat. Fails with
    /// [`crate::ChatPulseError::ChatNotFound`] when the chat has never been
    /// observed.
    pub async fn chat_report(&self, chat_id: i64) -> Result<ChatReport> {
        self.aggregator.report_for(chat_id).await
    }

    /// Reports for every tracked chat, ordered by chat id. Fails with
    /// [`crate::ChatPulseError::NoData`] when nothing is tracked yet.
    pub async fn all_chat_reports(&self) -> Result<Vec<ChatReport>> {
        self.aggregator.report_all().await
    }
}
