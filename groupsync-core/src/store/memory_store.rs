/*
    memory_store.rs - In-process SharedStateStore

    One RwLock over all keys gives per-key atomicity trivially. Used by tests,
    by the CLI (through JSON snapshots) and as the reference for the trait's
    semantics. Write counters let callers assert that a pass changed nothing.
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{SharedStateStore, StoreResult};
use crate::model::ResourceState;

/// Serializable image of the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub lists: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub maps: BTreeMap<String, BTreeMap<String, ResourceState>>,
}

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub reads: u64,
    /// Calls that changed stored data
    pub writes: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreSnapshot>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
            ..Default::default()
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.data.read().await.clone()
    }

    /// Load a JSON snapshot; a missing file yields an empty store
    pub fn load_snapshot(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_snapshot(serde_json::from_str(&contents)?))
    }

    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(&*self.data.read().await)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl SharedStateStore for MemoryStore {
    async fn list(&self, key: &str) -> StoreResult<Vec<String>> {
        self.record_read();
        Ok(self.data.read().await.lists.get(key).cloned().unwrap_or_default())
    }

    async fn list_append_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let list = data.lists.entry(key.to_string()).or_default();
        if list.iter().any(|existing| existing == value) {
            return Ok(false);
        }
        list.push(value.to_string());
        self.record_write();
        Ok(true)
    }

    async fn map_entries(&self, key: &str) -> StoreResult<Vec<(String, ResourceState)>> {
        self.record_read();
        let data = self.data.read().await;
        Ok(data
            .maps
            .get(key)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn map_get(&self, key: &str, entry: &str) -> StoreResult<Option<ResourceState>> {
        self.record_read();
        Ok(self.data.read().await.maps.get(key).and_then(|map| map.get(entry)).cloned())
    }

    async fn map_put(&self, key: &str, entry: &str, state: ResourceState) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.maps.entry(key.to_string()).or_default().insert(entry.to_string(), state);
        self.record_write();
        Ok(())
    }
}
