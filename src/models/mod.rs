//! Data models module
//!
//! This module contains the membership data model: per-chat aggregates and
//! the membership-transition types fed into the aggregator.

pub mod chat;

pub use chat::{ChatAggregate, MembershipState, MembershipTransition, TransitionKind};
