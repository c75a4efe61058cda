//! Checkpoint manager for workflow runs.
//!
//! Wraps a `CheckpointStore` to provide the run-level protocol: snapshot the
//! full context after each successful step, and on resume find the step to
//! restart from. Snapshots are only taken after `execute` has returned `Ok`,
//! so a resume never re-enters a partially applied step.

use chrono::Utc;
use sha2::{Digest, Sha256};

use cogflow_types::error::StoreError;
use cogflow_types::workflow::{CheckpointRecord, WorkflowDefinition};

use super::context::WorkflowContext;
use crate::repository::checkpoint::CheckpointStore;

// ---------------------------------------------------------------------------
// Run identity
// ---------------------------------------------------------------------------

/// Identity under which a workflow's checkpoints are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// Sanitized workflow name.
    pub run_key: String,
    /// Fingerprint of the ordered `(id, type)` step list.
    pub definition_hash: String,
}

impl RunIdentity {
    pub fn for_definition(def: &WorkflowDefinition) -> Self {
        Self {
            run_key: run_key_for(&def.name),
            definition_hash: definition_hash(def),
        }
    }
}

/// Lowercase alphanumerics separated by single `-`. Empty names map to `workflow`.
pub fn run_key_for(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('-') {
            key.push('-');
        }
    }
    let key = key.trim_end_matches('-');
    if key.is_empty() {
        "workflow".to_string()
    } else {
        key.to_string()
    }
}

/// SHA-256 over the ordered `(id, type)` list, hex encoded.
pub fn definition_hash(def: &WorkflowDefinition) -> String {
    let mut hasher = Sha256::new();
    for step in &def.steps {
        hasher.update(step.id.as_bytes());
        hasher.update(b"\t");
        hasher.update(step.task_type.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Resume point
// ---------------------------------------------------------------------------

/// Where a run starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumePoint {
    /// No usable checkpoint: start at step 0 with an empty context.
    Fresh,
    /// Continue after `last_completed_step_id` with the restored context.
    Resume {
        /// Declaration index of the last completed step.
        step_index: usize,
        last_completed_step_id: String,
        context: WorkflowContext,
        /// Set when the step list changed since the checkpoint was written.
        definition_changed: bool,
    },
}

impl ResumePoint {
    /// Index of the first step to execute.
    pub fn start_index(&self) -> usize {
        match self {
            ResumePoint::Fresh => 0,
            ResumePoint::Resume { step_index, .. } => step_index + 1,
        }
    }
}

// ---------------------------------------------------------------------------
// CheckpointManager
// ---------------------------------------------------------------------------

/// Records and restores run checkpoints.
///
/// Generic over `S: CheckpointStore` so it works with the file store, the
/// in-memory store, or any other backend.
pub struct CheckpointManager<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot the context after the step at `step_index` succeeded.
    pub async fn save(
        &self,
        identity: &RunIdentity,
        step_index: usize,
        step_id: &str,
        ctx: &WorkflowContext,
    ) -> Result<CheckpointRecord, CheckpointError> {
        let record = CheckpointRecord {
            run_key: identity.run_key.clone(),
            step_index,
            completed_step_id: step_id.to_string(),
            definition_hash: identity.definition_hash.clone(),
            created_at: Utc::now(),
            context: ctx.entries().clone(),
        };
        self.store.save(&record).await?;

        tracing::debug!(
            run_key = identity.run_key.as_str(),
            step_id,
            step_index,
            keys = ctx.len(),
            "checkpoint saved"
        );
        Ok(record)
    }

    /// Find the resume point for `def` from its latest checkpoint.
    ///
    /// The completed step is located by id in the current definition, so a
    /// checkpoint naming a step that no longer exists is an error.
    pub async fn restore(
        &self,
        def: &WorkflowDefinition,
        identity: &RunIdentity,
    ) -> Result<ResumePoint, CheckpointError> {
        let Some(record) = self.store.load_latest(&identity.run_key).await? else {
            tracing::info!(run_key = identity.run_key.as_str(), "no checkpoint found, starting fresh");
            return Ok(ResumePoint::Fresh);
        };

        let step_index = def.position_of(&record.completed_step_id).ok_or_else(|| {
            CheckpointError::UnknownStep {
                run_key: identity.run_key.clone(),
                step_id: record.completed_step_id.clone(),
            }
        })?;

        let definition_changed = record.definition_hash != identity.definition_hash;
        if definition_changed {
            tracing::warn!(
                run_key = identity.run_key.as_str(),
                step_id = record.completed_step_id.as_str(),
                "workflow steps changed since the checkpoint was written"
            );
        }
        if step_index != record.step_index {
            tracing::warn!(
                step_id = record.completed_step_id.as_str(),
                recorded = record.step_index,
                current = step_index,
                "checkpointed step moved, resuming by id"
            );
        }

        tracing::info!(
            run_key = identity.run_key.as_str(),
            step_id = record.completed_step_id.as_str(),
            step_index,
            "resuming from checkpoint"
        );

        Ok(ResumePoint::Resume {
            step_index,
            last_completed_step_id: record.completed_step_id,
            context: WorkflowContext::from_entries(record.context),
            definition_changed,
        })
    }

    /// Remove every checkpoint for a run.
    pub async fn clear(&self, identity: &RunIdentity) -> Result<usize, CheckpointError> {
        let removed = self.store.clear(&identity.run_key).await?;
        if removed > 0 {
            tracing::debug!(run_key = identity.run_key.as_str(), removed, "cleared stale checkpoints");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// CheckpointError
// ---------------------------------------------------------------------------

/// Errors from checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The store failed to read or write.
    #[error("checkpoint store error: {0}")]
    Store(#[from] StoreError),

    /// The latest checkpoint names a step the workflow no longer declares.
    #[error("checkpoint for '{run_key}' refers to step '{step_id}', which is not in the workflow")]
    UnknownStep { run_key: String, step_id: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
