//! Snapshot persistence
//!
//! This module persists the full chat registry as a JSON document. Writes go
//! to a temporary file in the same directory followed by an atomic rename, so
//! a crash mid-write can never corrupt previously committed data. Unreadable
//! or missing snapshots load as an empty registry: starting fresh is always
//! preferred over refusing to start.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::stats::registry::ChatRegistry;
use crate::utils::errors::Result;

/// Durable store for the chat registry.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted registry, or an empty one when nothing usable exists.
    async fn load(&self) -> Result<ChatRegistry>;

    /// Serialize the complete registry to durable storage, replacing prior state.
    async fn save(&self, registry: &ChatRegistry) -> Result<()>;
}

/// JSON-file snapshot store.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<ChatRegistry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file, starting with empty registry");
                return Ok(ChatRegistry::new());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e,
                      "Snapshot unreadable, starting with empty registry");
                return Ok(ChatRegistry::new());
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e,
                      "Snapshot corrupt, starting with empty registry");
                Ok(ChatRegistry::new())
            }
        }
    }

    async fn save(&self, registry: &ChatRegistry) -> Result<()> {
        let payload = serde_json::to_vec_pretty(registry)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), chats = registry.len(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_registry() -> ChatRegistry {
        let mut registry = ChatRegistry::new();
        {
            let aggregate = registry.ensure(-100500);
            aggregate.observe_title("Swing Chat");
            aggregate.reset_for_day("2024-06-01".parse().unwrap(), 57);
            aggregate.record_join(None);
            aggregate.record_leave(None);
        }
        registry.ensure(77);
        registry
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("stats.json"));

        let registry = sample_registry();
        store.save(&registry).await.unwrap();

        let restored = store.load().await.unwrap();
        assert_eq!(restored, registry);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("absent.json"));

        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = JsonSnapshotStore::new(&path);
        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_prior_state_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let store = JsonSnapshotStore::new(&path);

        store.save(&sample_registry()).await.unwrap();
        store.save(&ChatRegistry::new()).await.unwrap();

        let restored = store.load().await.unwrap();
        assert!(restored.is_empty());
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("nested/state/stats.json"));

        store.save(&sample_registry()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), sample_registry());
    }
}
