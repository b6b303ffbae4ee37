//! Storage module
//!
//! This module handles durable persistence of the chat registry.

pub mod snapshot;

pub use snapshot::{JsonSnapshotStore, SnapshotStore};
