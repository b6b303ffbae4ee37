//! Membership statistics aggregator
//!
//! The aggregator is the sole writer of the chat registry. It applies
//! membership transitions, runs the daily snapshot sweep, and performs the
//! day-rollover resets that query paths may trigger. All public operations
//! serialize on one registry lock, so each aggregate's read-modify-write
//! sequence (rollover check, delta, persistence) is a critical section.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::{MembershipTransition, TransitionKind};
use crate::services::{CountLookup, MemberCountProvider};
use crate::stats::clock::Clock;
use crate::stats::query::ChatReport;
use crate::stats::registry::ChatRegistry;
use crate::storage::SnapshotStore;
use crate::utils::errors::{ChatPulseError, Result};

/// Result of one daily snapshot sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Chats whose counters were anchored to a fresh authoritative count.
    pub reset: usize,
    /// Chats skipped because the lookup failed; their counters stay untouched.
    pub skipped: usize,
}

/// Stateful aggregation core for membership churn.
pub struct StatsAggregator {
    registry: Mutex<ChatRegistry>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    counts: Arc<dyn MemberCountProvider>,
}

impl StatsAggregator {
    pub fn new(
        registry: ChatRegistry,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        counts: Arc<dyn MemberCountProvider>,
    ) -> Self {
        Self {
            registry: Mutex::new(registry),
            store,
            clock,
            counts,
        }
    }

    /// Apply one membership transition.
    ///
    /// Transitions that do not cross the membership boundary are ignored
    /// without any state change or persistence write. Counted transitions
    /// ensure the aggregate exists, roll the day over if its counters are
    /// stale, apply the join/leave delta, and write the snapshot through.
    pub async fn apply_transition(&self, transition: MembershipTransition) -> Result<TransitionKind> {
        let kind = TransitionKind::classify(transition.old_state, transition.new_state);
        if kind == TransitionKind::Ignore {
            debug!(
                chat_id = transition.chat_id,
                old = ?transition.old_state,
                new = ?transition.new_state,
                "Transition does not cross the membership boundary, ignoring"
            );
            return Ok(kind);
        }

        let lookup = self.counts.member_count(transition.chat_id).await;
        let today = self.clock.today();

        let mut registry = self.registry.lock().await;
        let aggregate = registry.ensure(transition.chat_id);
        if let Some(title) = transition.title.as_deref() {
            aggregate.observe_title(title);
        }

        let seed = lookup.or_fallback(aggregate.current_count);
        aggregate.rollover_if_stale(today, seed);

        match kind {
            TransitionKind::Join => aggregate.record_join(lookup.fresh_count()),
            TransitionKind::Leave => aggregate.record_leave(lookup.fresh_count()),
            TransitionKind::Ignore => {}
        }

        info!(
            chat_id = transition.chat_id,
            kind = ?kind,
            joined_today = aggregate.joined_today,
            left_today = aggregate.left_today,
            current_count = aggregate.current_count,
            "Membership transition applied"
        );

        self.persist(&registry).await?;
        Ok(kind)
    }

    /// Anchor every reachable chat to a fresh authoritative count.
    ///
    /// Chats whose lookup fails are skipped with their counters untouched: a
    /// transient failure must not wipe out data for a chat the bot currently
    /// cannot query. A single snapshot write covers the whole sweep.
    pub async fn daily_sweep(&self) -> Result<SweepSummary> {
        let today = self.clock.today();
        let mut registry = self.registry.lock().await;
        let mut summary = SweepSummary::default();

        for chat_id in registry.chat_ids() {
            match self.counts.member_count(chat_id).await {
                CountLookup::Fresh(count) => {
                    if let Some(aggregate) = registry.get_mut(chat_id) {
                        aggregate.reset_for_day(today, count);
                        summary.reset += 1;
                    }
                }
                CountLookup::Unavailable => {
                    warn!(chat_id = chat_id, "Member count unavailable, skipping chat in daily sweep");
                    summary.skipped += 1;
                }
            }
        }

        self.persist(&registry).await?;
        info!(reset = summary.reset, skipped = summary.skipped, "Daily snapshot sweep completed");
        Ok(summary)
    }

    /// Snapshot one chat for reporting, rolling its day over first if stale.
    pub(crate) async fn report_for(&self, chat_id: i64) -> Result<ChatReport> {
        let today = self.clock.today();
        let mut registry = self.registry.lock().await;

        let stale = match registry.get(chat_id) {
            Some(aggregate) => aggregate.needs_rollover(today),
            None => return Err(ChatPulseError::ChatNotFound { chat_id }),
        };

        if stale {
            let lookup = self.counts.member_count(chat_id).await;
            if let Some(aggregate) = registry.get_mut(chat_id) {
                let seed = lookup.or_fallback(aggregate.current_count);
                aggregate.rollover_if_stale(today, seed);
            }
            // A failed write must not fail the read; the rollover stands in memory.
            if let Err(e) = self.persist(&registry).await {
                warn!(chat_id = chat_id, error = %e, "Snapshot save after query rollover failed");
            }
        }

        registry
            .get(chat_id)
            .map(|aggregate| ChatReport::from_aggregate(chat_id, aggregate))
            .ok_or(ChatPulseError::ChatNotFound { chat_id })
    }

    /// Snapshot all chats for reporting, tolerating per-chat lookup failures.
    pub(crate) async fn report_all(&self) -> Result<Vec<ChatReport>> {
        let today = self.clock.today();
        let mut registry = self.registry.lock().await;

        if registry.is_empty() {
            return Err(ChatPulseError::NoData);
        }

        let mut rolled = false;
        for chat_id in registry.chat_ids() {
            let stale = registry
                .get(chat_id)
                .map_or(false, |aggregate| aggregate.needs_rollover(today));
            if !stale {
                continue;
            }
            let lookup = self.counts.member_count(chat_id).await;
            if let Some(aggregate) = registry.get_mut(chat_id) {
                let seed = lookup.or_fallback(aggregate.current_count);
                rolled |= aggregate.rollover_if_stale(today, seed);
            }
        }

        if rolled {
            if let Err(e) = self.persist(&registry).await {
                warn!(error = %e, "Snapshot save after listing rollover failed");
            }
        }

        Ok(registry
            .iter()
            .map(|(chat_id, aggregate)| ChatReport::from_aggregate(chat_id, aggregate))
            .collect())
    }

    /// Number of tracked chats.
    pub async fn tracked_chats(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn persist(&self, registry: &ChatRegistry) -> Result<()> {
        self.store.save(registry).await.map_err(|e| {
            error!(error = %e, "Failed to persist membership snapshot");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MembershipState;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Clock pinned to a settable date.
    struct FixedClock(StdMutex<NaiveDate>);

    impl FixedClock {
        fn at(date: &str) -> Arc<Self> {
            Arc::new(Self(StdMutex::new(date.parse().unwrap())))
        }

        fn set(&self, date: &str) {
            *self.0.lock().unwrap() = date.parse().unwrap();
        }
    }

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    /// Store that records every saved snapshot, optionally failing writes.
    #[derive(Default)]
    struct RecordingStore {
        saves: StdMutex<Vec<ChatRegistry>>,
        fail_writes: StdMutex<bool>,
    }

    impl RecordingStore {
        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        fn last_save(&self) -> Option<ChatRegistry> {
            self.saves.lock().unwrap().last().cloned()
        }

        fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl SnapshotStore for RecordingStore {
        async fn load(&self) -> Result<ChatRegistry> {
            Ok(self.last_save().unwrap_or_default())
        }

        async fn save(&self, registry: &ChatRegistry) -> Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(ChatPulseError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.saves.lock().unwrap().push(registry.clone());
            Ok(())
        }
    }

    /// Per-chat scripted lookup results; unscripted chats are unavailable.
    #[derive(Default)]
    struct ScriptedCounts {
        by_chat: StdMutex<HashMap<i64, CountLookup>>,
    }

    impl ScriptedCounts {
        fn with(entries: &[(i64, CountLookup)]) -> Arc<Self> {
            let provider = Self::default();
            *provider.by_chat.lock().unwrap() = entries.iter().copied().collect();
            Arc::new(provider)
        }

        fn set(&self, chat_id: i64, lookup: CountLookup) {
            self.by_chat.lock().unwrap().insert(chat_id, lookup);
        }
    }

    #[async_trait]
    impl MemberCountProvider for ScriptedCounts {
        async fn member_count(&self, chat_id: i64) -> CountLookup {
            self.by_chat
                .lock()
                .unwrap()
                .get(&chat_id)
                .copied()
                .unwrap_or(CountLookup::Unavailable)
        }
    }

    fn join(chat_id: i64) -> MembershipTransition {
        MembershipTransition {
            chat_id,
            title: Some("Test Chat".to_string()),
            old_state: MembershipState::Left,
            new_state: MembershipState::Member,
        }
    }

    fn leave(chat_id: i64) -> MembershipTransition {
        MembershipTransition {
            chat_id,
            title: None,
            old_state: MembershipState::Member,
            new_state: MembershipState::Left,
        }
    }

    struct Harness {
        aggregator: StatsAggregator,
        store: Arc<RecordingStore>,
        clock: Arc<FixedClock>,
        counts: Arc<ScriptedCounts>,
    }

    fn harness(registry: ChatRegistry, counts: Arc<ScriptedCounts>) -> Harness {
        let store = Arc::new(RecordingStore::default());
        let clock = FixedClock::at("2024-06-01");
        let aggregator = StatsAggregator::new(
            registry,
            store.clone(),
            clock.clone(),
            counts.clone(),
        );
        Harness {
            aggregator,
            store,
            clock,
            counts,
        }
    }

    #[tokio::test]
    async fn test_join_with_fresh_count_seeds_new_chat() {
        let h = harness(
            ChatRegistry::new(),
            ScriptedCounts::with(&[(-10, CountLookup::Fresh(50))]),
        );

        let kind = h.aggregator.apply_transition(join(-10)).await.unwrap();
        assert_eq!(kind, TransitionKind::Join);

        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 1);
        assert_eq!(report.current_count, 50);
        assert_eq!(report.midnight_count, Some(50));
        assert_eq!(report.title, "Test Chat");

        let saved = h.store.last_save().unwrap();
        assert_eq!(saved.get(-10).unwrap().last_reset_date, Some(h.clock.today()));
    }

    #[tokio::test]
    async fn test_promotion_is_ignored_entirely() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        let transition = MembershipTransition {
            chat_id: -10,
            title: None,
            old_state: MembershipState::Member,
            new_state: MembershipState::Administrator,
        };
        let kind = h.aggregator.apply_transition(transition).await.unwrap();

        assert_eq!(kind, TransitionKind::Ignore);
        assert_eq!(h.aggregator.tracked_chats().await, 0);
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_every_counted_transition_writes_through() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        h.aggregator.apply_transition(join(-10)).await.unwrap();
        h.aggregator.apply_transition(join(-10)).await.unwrap();
        h.aggregator.apply_transition(leave(-10)).await.unwrap();

        assert_eq!(h.store.save_count(), 3);
    }

    #[tokio::test]
    async fn test_leaves_clamp_at_zero_without_fresh_count() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        h.aggregator.apply_transition(leave(-10)).await.unwrap();
        h.aggregator.apply_transition(leave(-10)).await.unwrap();

        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.current_count, 0);
        assert_eq!(report.left_today, 2);
    }

    #[tokio::test]
    async fn test_duplicate_joins_double_count_until_fresh_lookup() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        // Replayed event with no authoritative count: drift accumulates.
        h.aggregator.apply_transition(join(-10)).await.unwrap();
        h.aggregator.apply_transition(join(-10)).await.unwrap();
        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 2);
        assert_eq!(report.current_count, 2);

        // Next successful lookup corrects the running count.
        h.counts.set(-10, CountLookup::Fresh(1));
        h.aggregator.apply_transition(join(-10)).await.unwrap();
        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 3);
        assert_eq!(report.current_count, 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_in_memory_update() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));
        h.store.set_fail_writes(true);

        let result = h.aggregator.apply_transition(join(-10)).await;
        assert_matches!(result, Err(ChatPulseError::Io(_)));

        // The event is still applied in memory.
        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 1);
    }

    #[tokio::test]
    async fn test_query_on_new_day_resets_before_reporting() {
        let mut registry = ChatRegistry::new();
        {
            let aggregate = registry.ensure(-10);
            aggregate.current_count = 50;
            aggregate.joined_today = 1;
            aggregate.midnight_count = Some(49);
            aggregate.last_reset_date = Some("2024-05-31".parse().unwrap());
        }
        let h = harness(registry, ScriptedCounts::with(&[]));
        h.clock.set("2024-06-01");

        // No fresh count available: the rollover seeds from the last known count.
        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 0);
        assert_eq!(report.left_today, 0);
        assert_eq!(report.midnight_count, Some(50));
        assert_eq!(report.current_count, 50);

        // And the rollover was persisted.
        let saved = h.store.last_save().unwrap();
        assert_eq!(saved.get(-10).unwrap().last_reset_date, Some(h.clock.today()));
    }

    #[tokio::test]
    async fn test_query_rollover_is_idempotent() {
        let mut registry = ChatRegistry::new();
        registry.ensure(-10).reset_for_day("2024-05-31".parse().unwrap(), 5);
        let h = harness(registry, ScriptedCounts::with(&[]));
        h.clock.set("2024-06-01");

        let first = h.aggregator.report_for(-10).await.unwrap();
        let second = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(first, second);
        // Only the first query rolled over and persisted.
        assert_eq!(h.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_chat_and_empty_registry_errors() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        assert_matches!(
            h.aggregator.report_for(-99).await,
            Err(ChatPulseError::ChatNotFound { chat_id: -99 })
        );
        assert_matches!(h.aggregator.report_all().await, Err(ChatPulseError::NoData));
    }

    #[tokio::test]
    async fn test_sweep_skips_failed_lookup_and_resets_the_rest() {
        let mut registry = ChatRegistry::new();
        registry.ensure(-1).reset_for_day("2024-05-31".parse().unwrap(), 10);
        {
            let aggregate = registry.ensure(-2);
            aggregate.reset_for_day("2024-05-31".parse().unwrap(), 20);
            aggregate.record_join(None);
        }
        let h = harness(registry, ScriptedCounts::with(&[(-1, CountLookup::Fresh(11))]));
        h.clock.set("2024-06-01");

        let summary = h.aggregator.daily_sweep().await.unwrap();
        assert_eq!(summary, SweepSummary { reset: 1, skipped: 1 });
        assert_eq!(h.store.save_count(), 1);

        let saved = h.store.last_save().unwrap();
        let swept = saved.get(-1).unwrap();
        assert_eq!(swept.midnight_count, Some(11));
        assert_eq!(swept.last_reset_date, Some(h.clock.today()));

        // The failed chat keeps its prior-day counters untouched.
        let skipped = saved.get(-2).unwrap();
        assert_eq!(skipped.joined_today, 1);
        assert_eq!(skipped.current_count, 21);
        assert_eq!(skipped.last_reset_date, Some("2024-05-31".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_report_all_tolerates_lookup_failures() {
        let mut registry = ChatRegistry::new();
        registry.ensure(-1).reset_for_day("2024-05-31".parse().unwrap(), 10);
        registry.ensure(-2).reset_for_day("2024-05-31".parse().unwrap(), 20);
        let h = harness(registry, ScriptedCounts::with(&[(-1, CountLookup::Fresh(12))]));
        h.clock.set("2024-06-01");

        let reports = h.aggregator.report_all().await.unwrap();
        assert_eq!(reports.len(), 2);
        // Sorted by chat id: -2 first.
        assert_eq!(reports[0].chat_id, -2);
        assert_eq!(reports[0].current_count, 20);
        assert_eq!(reports[1].chat_id, -1);
        assert_eq!(reports[1].current_count, 12);
        // One save for the whole listing.
        assert_eq!(h.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_title_updates_but_never_clears() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[]));

        h.aggregator.apply_transition(join(-10)).await.unwrap();
        let mut renamed = leave(-10);
        renamed.title = Some("Renamed Chat".to_string());
        h.aggregator.apply_transition(renamed).await.unwrap();
        h.aggregator.apply_transition(leave(-10)).await.unwrap();

        let report = h.aggregator.report_for(-10).await.unwrap();
        assert_eq!(report.title, "Renamed Chat");
    }

    #[tokio::test]
    async fn test_restart_round_trip_preserves_aggregates() {
        let h = harness(ChatRegistry::new(), ScriptedCounts::with(&[(-10, CountLookup::Fresh(50))]));
        h.aggregator.apply_transition(join(-10)).await.unwrap();

        // Simulate a restart from the same store.
        let restored = h.store.load().await.unwrap();
        let revived = StatsAggregator::new(
            restored,
            h.store.clone(),
            h.clock.clone(),
            h.counts.clone(),
        );

        let report = revived.report_for(-10).await.unwrap();
        assert_eq!(report.joined_today, 1);
        assert_eq!(report.current_count, 50);
    }
}
