//! Checkpoint store trait definition and an in-memory implementation.
//!
//! The infrastructure layer (cogflow-infra) implements `CheckpointStore`
//! with one JSON file per completed step.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use cogflow_types::error::StoreError;
use cogflow_types::workflow::CheckpointRecord;

/// Storage for checkpoint records, grouped by run key.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CheckpointStore: Send + Sync {
    /// Persist a record. A record for the same step index replaces the old one.
    fn save(
        &self,
        record: &CheckpointRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The record with the highest step index for `run_key`, if any.
    fn load_latest(
        &self,
        run_key: &str,
    ) -> impl Future<Output = Result<Option<CheckpointRecord>, StoreError>> + Send;

    /// All records for `run_key`, ordered by step index.
    fn list(
        &self,
        run_key: &str,
    ) -> impl Future<Output = Result<Vec<CheckpointRecord>, StoreError>> + Send;

    /// Remove every record for `run_key`. Returns how many were removed.
    fn clear(&self, run_key: &str) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Process-local checkpoint store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    runs: Arc<Mutex<HashMap<String, Vec<CheckpointRecord>>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<CheckpointRecord>>>, StoreError> {
        self.runs
            .lock()
            .map_err(|_| StoreError::Io("checkpoint store lock poisoned".to_string()))
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, record: &CheckpointRecord) -> Result<(), StoreError> {
        let mut runs = self.lock()?;
        let records = runs.entry(record.run_key.clone()).or_default();
        records.retain(|r| r.step_index != record.step_index);
        records.push(record.clone());
        records.sort_by_key(|r| r.step_index);
        Ok(())
    }

    async fn load_latest(&self, run_key: &str) -> Result<Option<CheckpointRecord>, StoreError> {
        let runs = self.lock()?;
        Ok(runs
            .get(run_key)
            .and_then(|records| records.iter().max_by_key(|r| r.step_index))
            .cloned())
    }

    async fn list(&self, run_key: &str) -> Result<Vec<CheckpointRecord>, StoreError> {
        let runs = self.lock()?;
        Ok(runs.get(run_key).cloned().unwrap_or_default())
    }

    async fn clear(&self, run_key: &str) -> Result<usize, StoreError> {
        let mut runs = self.lock()?;
        Ok(runs.remove(run_key).map(|records| records.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(run_key: &str, step_index: usize, step_id: &str) -> CheckpointRecord {
        CheckpointRecord {
            run_key: run_key.to_string(),
            step_index,
            completed_step_id: step_id.to_string(),
            definition_hash: "abc".to_string(),
            created_at: Utc::now(),
            context: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_latest_is_highest_step_index() {
        let store = InMemoryCheckpointStore::new();
        store.save(&record("run", 1, "split")).await.unwrap();
        store.save(&record("run", 0, "load")).await.unwrap();

        let latest = store.load_latest("run").await.unwrap().unwrap();
        assert_eq!(latest.completed_step_id, "split");
        assert_eq!(store.list("run").await.unwrap().len(), 2);
        assert!(store.load_latest("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_same_index() {
        let store = InMemoryCheckpointStore::new();
        store.save(&record("run", 0, "load")).await.unwrap();
        store.save(&record("run", 0, "reload")).await.unwrap();

        let records = store.list("run").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].completed_step_id, "reload");
    }

    #[tokio::test]
    async fn test_clear_removes_only_that_run() {
        let store = InMemoryCheckpointStore::new();
        store.save(&record("a", 0, "load")).await.unwrap();
        store.save(&record("a", 1, "split")).await.unwrap();
        store.save(&record("b", 0, "load")).await.unwrap();

        assert_eq!(store.clear("a").await.unwrap(), 2);
        assert!(store.load_latest("a").await.unwrap().is_none());
        assert!(store.load_latest("b").await.unwrap().is_some());
        assert_eq!(store.clear("a").await.unwrap(), 0);
    }
}
