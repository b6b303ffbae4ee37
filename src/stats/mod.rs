//! Membership statistics module
//!
//! This module contains the aggregation core: the chat registry, the
//! aggregator that is its sole writer, the read-only report service, the
//! fixed-timezone clock, and the daily sweep schedule.

pub mod aggregator;
pub mod clock;
pub mod query;
pub mod registry;
pub mod schedule;

pub use aggregator::{StatsAggregator, SweepSummary};
pub use clock::{Clock, FixedOffsetClock};
pub use query::{ChatReport, ReportService};
pub use registry::ChatRegistry;
