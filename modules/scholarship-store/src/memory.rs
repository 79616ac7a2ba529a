//! In-memory entity store. Used by tests and by file replays.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use scholarship_common::EntityKind;

use crate::traits::EntityStore;

/// `BTreeMap`-backed store. Thread-safe. Iteration order is stable, so two
/// snapshots can be compared directly.
#[derive(Default)]
pub struct MemoryEntityStore {
    records: Mutex<BTreeMap<(EntityKind, String), serde_json::Value>>,
    writes: AtomicU64,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored document (for test assertions).
    pub fn snapshot(&self) -> BTreeMap<(EntityKind, String), serde_json::Value> {
        self.records.lock().unwrap().clone()
    }

    /// Number of stored documents of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.records
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Total number of `save_raw` calls, including no-op overwrites.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn load_raw(&self, kind: EntityKind, id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(kind, id.to_string()))
            .cloned())
    }

    async fn save_raw(
        &self,
        kind: EntityKind,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert((kind, id.to_string()), payload);
        Ok(())
    }

    async fn list_raw(&self, kind: EntityKind) -> Result<Vec<(String, serde_json::Value)>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, id), payload)| (id.clone(), payload.clone()))
            .collect())
    }
}
