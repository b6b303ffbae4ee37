//! Fixed-timezone clock
//!
//! Day boundaries are anchored to a configured fixed UTC offset, not to the
//! host timezone. The trait seam exists so tests can pin and advance the date.

use chrono::{FixedOffset, NaiveDate, Utc};

/// Supplies the current date in the tracker's fixed timezone.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Production clock based on a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedOffsetClock {
    offset: FixedOffset,
}

impl FixedOffsetClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build a clock from a whole-hour UTC offset, e.g. `3` for UTC+3.
    pub fn from_utc_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }
}

impl Clock for FixedOffsetClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}
