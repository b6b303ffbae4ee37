//! Daily sweep schedule
//!
//! Fires the daily snapshot sweep at a configured wall-clock time in the
//! tracker's fixed timezone.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use tracing::{error, info};

use crate::stats::aggregator::StatsAggregator;

/// Next occurrence of `hour:minute` local time, strictly after `now`.
pub fn next_sweep_at(now: DateTime<FixedOffset>, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    let sweep_time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let mut target = now.date_naive().and_time(sweep_time);
    if target <= now.naive_local() {
        target = target + Duration::days(1);
    }
    // A fixed offset has no gaps or folds, so the local datetime is unique.
    match now.offset().from_local_datetime(&target) {
        chrono::LocalResult::Single(at) => at,
        _ => now + Duration::days(1),
    }
}

/// Long-running task that triggers the daily sweep at the configured time.
pub async fn run_sweep_loop(
    aggregator: Arc<StatsAggregator>,
    offset: FixedOffset,
    hour: u32,
    minute: u32,
) {
    loop {
        let now = Utc::now().with_timezone(&offset);
        let next = next_sweep_at(now, hour, minute);
        let wait = (next - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60));

        info!(next_sweep = %next, "Daily sweep scheduled");
        tokio::time::sleep(wait).await;

        match aggregator.daily_sweep().await {
            Ok(summary) => {
                info!(reset = summary.reset, skipped = summary.skipped, "Daily sweep finished");
            }
            Err(e) => {
                error!(error = %e, "Daily sweep failed");
            }
        }
    }
}
