//! File-backed checkpoint store.
//!
//! Layout: `{root}/{run_key}/{step_index:03}-{step_id}.json`, one pretty JSON
//! `CheckpointRecord` per completed step. Records are written to a temporary
//! file in the same directory and renamed into place, so a crash mid-write
//! never leaves a truncated checkpoint behind. A record that previously held
//! the same index is removed only after its replacement is on disk.

use std::path::{Path, PathBuf};

use cogflow_core::repository::checkpoint::CheckpointStore;
use cogflow_types::error::StoreError;
use cogflow_types::workflow::CheckpointRecord;

/// Checkpoint store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    root: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one run's records.
    pub fn run_dir(&self, run_key: &str) -> PathBuf {
        self.root.join(run_key)
    }

    /// File name for a record: `{step_index:03}-{step_id}.json`.
    pub fn file_name(step_index: usize, step_id: &str) -> String {
        let safe_id: String = step_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{step_index:03}-{safe_id}.json")
    }

    async fn record_files(&self, run_key: &str) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.run_dir(run_key);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_record(path: &Path) -> Result<CheckpointRecord, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, record: &CheckpointRecord) -> Result<(), StoreError> {
        let dir = self.run_dir(&record.run_key);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = Self::file_name(record.step_index, &record.completed_step_id);
        let path = dir.join(&file_name);
        let tmp = dir.join(format!(".{file_name}.tmp"));
        let json = serde_json::to_string_pretty(record)?;

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        // A different step may have held this index in an older definition.
        // Only drop it once the replacement is in place.
        let prefix = format!("{:03}-", record.step_index);
        for existing in self.record_files(&record.run_key).await? {
            let stale = existing
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n != file_name);
            if stale {
                tokio::fs::remove_file(&existing).await?;
            }
        }

        tracing::debug!(path = %path.display(), "wrote checkpoint file");
        Ok(())
    }

    async fn load_latest(&self, run_key: &str) -> Result<Option<CheckpointRecord>, StoreError> {
        Ok(self.list(run_key).await?.pop())
    }

    async fn list(&self, run_key: &str) -> Result<Vec<CheckpointRecord>, StoreError> {
        let mut records = Vec::new();
        for path in self.record_files(run_key).await? {
            records.push(Self::read_record(&path).await?);
        }
        records.sort_by_key(|r| r.step_index);
        Ok(records)
    }

    async fn clear(&self, run_key: &str) -> Result<usize, StoreError> {
        let count = self.record_files(run_key).await?.len();
        match tokio::fs::remove_dir_all(self.run_dir(run_key)).await {
            Ok(()) => Ok(count),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::Utc;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(step_index: usize, step_id: &str) -> CheckpointRecord {
        let mut context = BTreeMap::new();
        context.insert("text".to_string(), json!("hello"));
        context.insert("docs".to_string(), json!([{"filename": "a.txt", "content": "x"}]));
        context.insert("count".to_string(), json!(3));
        context.insert("none".to_string(), json!(null));
        CheckpointRecord {
            run_key: "notes".to_string(),
            step_index,
            completed_step_id: step_id.to_string(),
            definition_hash: "f00d".to_string(),
            created_at: Utc::now(),
            context,
        }
    }

    #[test]
    fn test_file_name_is_padded_and_safe() {
        assert_eq!(FileCheckpointStore::file_name(2, "load"), "002-load.json");
        assert_eq!(FileCheckpointStore::file_name(12, "a/b c"), "012-a_b_c.json");
    }

    #[tokio::test]
    async fn test_save_writes_file_and_roundtrips() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let saved = record(0, "load");

        store.save(&saved).await.unwrap();

        let path = dir.path().join("notes").join("000-load.json");
        assert!(path.exists());
        let loaded = store.load_latest("notes").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        // No temporary files left behind.
        let names: Vec<_> = std::fs::read_dir(dir.path().join("notes"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_latest_orders_by_step_index() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for (i, id) in ["load", "split", "summarize"].iter().enumerate() {
            store.save(&record(i, id)).await.unwrap();
        }

        let latest = store.load_latest("notes").await.unwrap().unwrap();
        assert_eq!(latest.completed_step_id, "summarize");
        assert_eq!(store.list("notes").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_save_replaces_record_at_same_index() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save(&record(1, "old-step")).await.unwrap();
        store.save(&record(1, "new-step")).await.unwrap();

        let records = store.list("notes").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].completed_step_id, "new-step");
    }

    #[tokio::test]
    async fn test_failed_replacement_keeps_previous_record() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save(&record(0, "load")).await.unwrap();
        store.save(&record(1, "old-step")).await.unwrap();

        // A directory squatting on the temp path makes the write fail.
        let run_dir = dir.path().join("notes");
        std::fs::create_dir(run_dir.join(".001-new-step.json.tmp")).unwrap();

        assert!(store.save(&record(1, "new-step")).await.is_err());

        let latest = store.load_latest("notes").await.unwrap().unwrap();
        assert_eq!(latest.completed_step_id, "old-step");
        assert!(run_dir.join("001-old-step.json").exists());
    }

    #[tokio::test]
    async fn test_missing_run_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(store.load_latest("never-ran").await.unwrap().is_none());
        assert_eq!(store.clear("never-ran").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_removes_run_directory() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save(&record(0, "load")).await.unwrap();
        store.save(&record(1, "split")).await.unwrap();

        assert_eq!(store.clear("notes").await.unwrap(), 2);
        assert!(!dir.path().join("notes").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let run_dir = dir.path().join("notes");
        std::fs::create_dir_all(&run_dir).unwrap();
        std::fs::write(run_dir.join("000-load.json"), "{ not json").unwrap();

        let err = store.load_latest("notes").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "got: {err}");
    }
}
