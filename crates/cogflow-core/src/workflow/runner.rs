//! Workflow runner: validates a definition, then executes its steps strictly
//! in declaration order against one shared context.
//!
//! # Execution flow
//!
//! 1. Validate every step (unique ids, registered types). All issues are
//!    reported together and nothing executes if any exist.
//! 2. Pick the starting point: a fresh context, or the context restored from
//!    the latest checkpoint with every step up to it skipped.
//! 3. For each remaining step: resolve a fresh task, `execute`, time and log
//!    it, then checkpoint the context.
//! 4. On the first failure stop. The failed step is not checkpointed; the
//!    context at the point of failure travels with the error.

use std::sync::Arc;
use std::time::Instant;

use cogflow_types::workflow::{RunStatus, StepRecord, StepStatus, WorkflowDefinition};
use serde::Serialize;
use tracing::Instrument;

use super::checkpoint::{CheckpointError, CheckpointManager, ResumePoint, RunIdentity};
use super::context::WorkflowContext;
use super::definition::{validate_definition, ValidationErrors};
use super::registry::TaskRegistry;
use super::task::TaskError;
use crate::repository::checkpoint::CheckpointStore;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Per-run switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Continue from the latest checkpoint instead of starting over.
    pub resume: bool,
    /// Write a checkpoint after every successful step.
    pub checkpoints: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            resume: false,
            checkpoints: true,
        }
    }
}

/// Outcome of a run that executed every remaining step.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub run_key: String,
    pub status: RunStatus,
    /// Final context: the workflow's output.
    pub context: WorkflowContext,
    /// One record per declared step, in declaration order.
    pub steps: Vec<StepRecord>,
    /// Id of the checkpointed step this run resumed after, if any.
    pub resumed_from: Option<String>,
    /// Checkpoint problems that did not fail the run.
    pub checkpoint_warnings: Vec<String>,
    pub duration_ms: u64,
}

/// State of a run at the moment it aborted.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub run_key: String,
    /// Always [`RunStatus::Aborted`].
    pub status: RunStatus,
    /// Context as the failed step left it. Not a valid resume point.
    pub context: WorkflowContext,
    pub steps: Vec<StepRecord>,
}

// ---------------------------------------------------------------------------
// RunError
// ---------------------------------------------------------------------------

/// Why a run did not complete.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The definition is invalid; no step executed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A step read a context key no earlier step wrote.
    #[error("step '{step_id}' ({task_type}) failed: missing required context key '{key}'")]
    MissingKey {
        step_id: String,
        task_type: String,
        key: String,
        run: Box<FailedRun>,
    },

    /// A task's own logic failed.
    #[error("step '{step_id}' ({task_type}) failed: {source}")]
    StepFailed {
        step_id: String,
        task_type: String,
        #[source]
        source: TaskError,
        run: Box<FailedRun>,
    },

    /// The resume point could not be restored; no step executed.
    #[error("cannot resume: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl RunError {
    /// The aborted run's state, for step failures.
    pub fn failed_run(&self) -> Option<&FailedRun> {
        match self {
            RunError::MissingKey { run, .. } | RunError::StepFailed { run, .. } => Some(run),
            RunError::Validation(_) | RunError::Checkpoint(_) => None,
        }
    }

    /// Context at the point of failure, for step failures.
    pub fn context(&self) -> Option<&WorkflowContext> {
        self.failed_run().map(|run| &run.context)
    }

    /// Id of the step that failed, for step failures.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            RunError::MissingKey { step_id, .. } | RunError::StepFailed { step_id, .. } => {
                Some(step_id)
            }
            RunError::Validation(_) | RunError::Checkpoint(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowRunner
// ---------------------------------------------------------------------------

/// Sequential workflow executor.
///
/// Generic over `S: CheckpointStore`; checkpoints are keyed by the sanitized
/// workflow name so a later run of the same workflow can resume.
pub struct WorkflowRunner<S: CheckpointStore> {
    registry: Arc<TaskRegistry>,
    checkpoints: CheckpointManager<S>,
}

impl<S: CheckpointStore> WorkflowRunner<S> {
    pub fn new(registry: Arc<TaskRegistry>, store: S) -> Self {
        Self {
            registry,
            checkpoints: CheckpointManager::new(store),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn checkpoints(&self) -> &CheckpointManager<S> {
        &self.checkpoints
    }

    /// Check a definition against the registry without running it.
    pub fn validate(&self, def: &WorkflowDefinition) -> Result<(), ValidationErrors> {
        validate_definition(def, &self.registry)
    }

    /// Run a workflow from an empty context (or its checkpoint when resuming).
    pub async fn run(
        &self,
        def: &WorkflowDefinition,
        options: &RunOptions,
    ) -> Result<ExecutionResult, RunError> {
        self.run_with_context(def, WorkflowContext::new(), options)
            .await
    }

    /// Run a workflow starting from `initial`.
    ///
    /// When resuming from a checkpoint the restored context replaces `initial`.
    pub async fn run_with_context(
        &self,
        def: &WorkflowDefinition,
        initial: WorkflowContext,
        options: &RunOptions,
    ) -> Result<ExecutionResult, RunError> {
        self.validate(def)?;

        let identity = RunIdentity::for_definition(def);
        let run_key = identity.run_key.clone();
        let mut warnings = Vec::new();

        let resume_point = if options.resume {
            self.checkpoints.restore(def, &identity).await?
        } else {
            // A fresh run discards earlier checkpoints even when it writes none.
            if let Err(e) = self.checkpoints.clear(&identity).await {
                tracing::warn!(run_key = run_key.as_str(), error = %e, "failed to clear stale checkpoints");
                warnings.push(format!("failed to clear stale checkpoints: {e}"));
            }
            ResumePoint::Fresh
        };

        let start_index = resume_point.start_index();
        let (mut ctx, resumed_from) = match resume_point {
            ResumePoint::Fresh => (initial, None),
            ResumePoint::Resume {
                last_completed_step_id,
                context,
                definition_changed,
                ..
            } => {
                if definition_changed {
                    warnings.push(format!(
                        "workflow steps changed since checkpoint '{last_completed_step_id}' was written"
                    ));
                }
                (context, Some(last_completed_step_id))
            }
        };

        let mut records: Vec<StepRecord> = def
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepRecord {
                id: step.id.clone(),
                task_type: step.task_type.clone(),
                status: if index < start_index {
                    StepStatus::Skipped
                } else {
                    StepStatus::Pending
                },
                duration_ms: 0,
                output: None,
            })
            .collect();

        tracing::info!(
            run_key = run_key.as_str(),
            workflow = def.name.as_str(),
            steps = def.steps.len(),
            start_index,
            resumed = resumed_from.is_some(),
            "starting workflow run"
        );
        for skipped in &def.steps[..start_index] {
            tracing::debug!(step_id = skipped.id.as_str(), "skipping completed step");
        }

        let run_start = Instant::now();

        for (index, step) in def.steps.iter().enumerate().skip(start_index) {
            records[index].status = StepStatus::Running;
            let span = tracing::info_span!(
                "step",
                step_id = step.id.as_str(),
                task_type = step.task_type.as_str()
            );

            let step_start = Instant::now();
            let outcome = async {
                tracing::info!(index, "step started");
                let task = self
                    .registry
                    .resolve(&step.task_type)
                    .map_err(|e| TaskError::Failed(e.to_string()))?;
                task.execute(&mut ctx, &step.config).await
            }
            .instrument(span)
            .await;
            let duration_ms = step_start.elapsed().as_millis() as u64;
            records[index].duration_ms = duration_ms;

            match outcome {
                Ok(output) => {
                    records[index].status = StepStatus::Succeeded;
                    records[index].output = output;
                    tracing::info!(
                        step_id = step.id.as_str(),
                        task_type = step.task_type.as_str(),
                        duration_ms,
                        "step succeeded"
                    );

                    if options.checkpoints {
                        if let Err(e) = self.checkpoints.save(&identity, index, &step.id, &ctx).await {
                            tracing::warn!(step_id = step.id.as_str(), error = %e, "checkpoint save failed");
                            warnings.push(format!("checkpoint after step '{}' failed: {e}", step.id));
                        }
                    }
                }
                Err(error) => {
                    records[index].status = StepStatus::Failed;
                    tracing::error!(
                        step_id = step.id.as_str(),
                        task_type = step.task_type.as_str(),
                        duration_ms,
                        %error,
                        "step failed, aborting run"
                    );

                    let run = Box::new(FailedRun {
                        run_key,
                        status: RunStatus::Aborted,
                        context: ctx,
                        steps: records,
                    });
                    return Err(match error {
                        TaskError::MissingKey(key) => RunError::MissingKey {
                            step_id: step.id.clone(),
                            task_type: step.task_type.clone(),
                            key,
                            run,
                        },
                        source => RunError::StepFailed {
                            step_id: step.id.clone(),
                            task_type: step.task_type.clone(),
                            source,
                            run,
                        },
                    });
                }
            }
        }

        let duration_ms = run_start.elapsed().as_millis() as u64;
        tracing::info!(
            run_key = run_key.as_str(),
            duration_ms,
            keys = ctx.len(),
            "workflow run completed"
        );

        Ok(ExecutionResult {
            run_key,
            status: RunStatus::Completed,
            context: ctx,
            steps: records,
            resumed_from,
            checkpoint_warnings: warnings,
            duration_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use cogflow_types::error::StoreError;
    use cogflow_types::workflow::{CheckpointRecord, StepConfig, StepDefinition};
    use serde_json::{json, Value};

    use crate::repository::checkpoint::InMemoryCheckpointStore;
    use crate::workflow::task::{BoxTask, Task};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Appends its output key to the log and writes `<input>+<output_key>`.
    struct Recorder {
        log: Log,
    }

    impl Task for Recorder {
        async fn execute(
            &self,
            ctx: &mut WorkflowContext,
            config: &StepConfig,
        ) -> Result<Option<Value>, TaskError> {
            let output_key = config.require_str("output_key")?;
            if let Ok(mut log) = self.log.lock() {
                log.push(output_key.to_string());
            }
            let previous = match config.opt_str("input_key")? {
                Some(key) => ctx.get_str(key)?.to_string(),
                None => String::new(),
            };
            ctx.set(output_key, json!(format!("{previous}+{output_key}")));
            Ok(Some(json!({ "wrote": output_key })))
        }
    }

    /// Fails while `armed` is set, otherwise behaves like a recorder.
    struct Flaky {
        armed: Arc<AtomicBool>,
        inner: Recorder,
    }

    impl Task for Flaky {
        async fn execute(
            &self,
            ctx: &mut WorkflowContext,
            config: &StepConfig,
        ) -> Result<Option<Value>, TaskError> {
            if self.armed.load(Ordering::SeqCst) {
                ctx.set("partial", json!("half-written"));
                return Err(TaskError::Failed("upstream unavailable".to_string()));
            }
            self.inner.execute(ctx, config).await
        }
    }

    /// Reads `input_key` and does nothing with it.
    #[derive(Default)]
    struct NoOpReader;

    impl Task for NoOpReader {
        async fn execute(
            &self,
            ctx: &mut WorkflowContext,
            config: &StepConfig,
        ) -> Result<Option<Value>, TaskError> {
            ctx.get(config.require_str("input_key")?)?;
            Ok(None)
        }
    }

    /// A store whose writes always fail.
    struct BrokenStore;

    impl CheckpointStore for BrokenStore {
        async fn save(&self, _record: &CheckpointRecord) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".to_string()))
        }

        async fn load_latest(&self, _run_key: &str) -> Result<Option<CheckpointRecord>, StoreError> {
            Ok(None)
        }

        async fn list(&self, _run_key: &str) -> Result<Vec<CheckpointRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn clear(&self, _run_key: &str) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    struct Fixture {
        log: Log,
        armed: Arc<AtomicBool>,
        registry: Arc<TaskRegistry>,
    }

    fn fixture() -> Fixture {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let armed = Arc::new(AtomicBool::new(false));
        let mut registry = TaskRegistry::new();

        let recorder_log = Arc::clone(&log);
        registry
            .register("Recorder", move || {
                BoxTask::new(Recorder {
                    log: Arc::clone(&recorder_log),
                })
            })
            .unwrap();

        let flaky_log = Arc::clone(&log);
        let flaky_armed = Arc::clone(&armed);
        registry
            .register("Flaky", move || {
                BoxTask::new(Flaky {
                    armed: Arc::clone(&flaky_armed),
                    inner: Recorder {
                        log: Arc::clone(&flaky_log),
                    },
                })
            })
            .unwrap();

        registry.register_task::<NoOpReader>("NoOpReader").unwrap();

        Fixture {
            log,
            armed,
            registry: Arc::new(registry),
        }
    }

    fn step(id: &str, task_type: &str, input: Option<&str>, output: &str) -> StepDefinition {
        let mut config = StepConfig::new().with("output_key", output);
        if let Some(input) = input {
            config = config.with("input_key", input);
        }
        StepDefinition::new(id, task_type, config)
    }

    fn chain(middle_type: &str) -> WorkflowDefinition {
        WorkflowDefinition {
            name: "Chain Test".to_string(),
            description: None,
            steps: vec![
                step("s1", "Recorder", None, "a"),
                step("s2", middle_type, Some("a"), "b"),
                step("s3", "Recorder", Some("b"), "c"),
            ],
        }
    }

    fn take_log(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[tokio::test]
    async fn test_steps_run_in_declaration_order() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());

        let result = runner.run(&chain("Recorder"), &RunOptions::default()).await.unwrap();

        assert_eq!(take_log(&fx.log), vec!["a", "b", "c"]);
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.run_key, "chain-test");
        assert_eq!(result.context.get_str("c").unwrap(), "+a+b+c");
        assert!(result.steps.iter().all(|s| s.status == StepStatus::Succeeded));
        assert_eq!(result.resumed_from, None);
    }

    #[tokio::test]
    async fn test_step_output_is_recorded_not_stored() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());

        let result = runner.run(&chain("Recorder"), &RunOptions::default()).await.unwrap();

        assert_eq!(result.steps[0].output, Some(json!({ "wrote": "a" })));
        assert!(!result.context.has("wrote"));
        assert_eq!(result.context.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_type_fails_before_any_step_runs() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());
        let mut def = chain("Recorder");
        def.steps.push(step("s4", "Recordr", Some("c"), "d"));
        def.steps.push(step("s1", "Recorder", None, "e"));

        let err = runner.run(&def, &RunOptions::default()).await.unwrap_err();

        match err {
            RunError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got: {other}"),
        }
        assert!(take_log(&fx.log).is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_names_step_and_key() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());
        let def = WorkflowDefinition {
            name: "wiring".to_string(),
            description: None,
            steps: vec![
                step("load", "Recorder", None, "x"),
                StepDefinition::new("use", "NoOpReader", StepConfig::new().with("input_key", "y")),
            ],
        };

        let err = runner.run(&def, &RunOptions::default()).await.unwrap_err();

        match &err {
            RunError::MissingKey { step_id, key, .. } => {
                assert_eq!(step_id, "use");
                assert_eq!(key, "y");
            }
            other => panic!("expected missing key, got: {other}"),
        }
        let ctx = err.context().unwrap();
        assert!(ctx.has("x"));
        assert!(!ctx.has("y"));
        let steps = &err.failed_run().unwrap().steps;
        assert_eq!(steps[0].status, StepStatus::Succeeded);
        assert_eq!(steps[1].status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_resume_after_failure_runs_only_remaining_steps() {
        let fx = fixture();
        let store = InMemoryCheckpointStore::new();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), store.clone());
        let def = chain("Flaky");

        fx.armed.store(true, Ordering::SeqCst);
        let err = runner.run(&def, &RunOptions::default()).await.unwrap_err();
        assert_eq!(err.step_id(), Some("s2"));
        assert_eq!(err.failed_run().unwrap().status, RunStatus::Aborted);
        assert_eq!(err.context().unwrap().get_str("partial").unwrap(), "half-written");
        assert_eq!(take_log(&fx.log), vec!["a"]);

        // Only the successful step was checkpointed.
        let latest = store.load_latest("chain-test").await.unwrap().unwrap();
        assert_eq!(latest.completed_step_id, "s1");
        assert_eq!(store.list("chain-test").await.unwrap().len(), 1);

        fx.armed.store(false, Ordering::SeqCst);
        let resume = RunOptions {
            resume: true,
            ..RunOptions::default()
        };
        let result = runner.run(&def, &resume).await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(take_log(&fx.log), vec!["b", "c"]);
        assert_eq!(result.resumed_from.as_deref(), Some("s1"));
        assert_eq!(result.steps[0].status, StepStatus::Skipped);
        assert_eq!(result.steps[1].status, StepStatus::Succeeded);
        // The failed attempt's partial write is not part of the resumed context.
        assert!(!result.context.has("partial"));
    }

    #[tokio::test]
    async fn test_resumed_run_matches_full_run() {
        let fx = fixture();
        let def = chain("Flaky");

        let full = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new())
            .run(&def, &RunOptions::default())
            .await
            .unwrap();

        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());
        fx.armed.store(true, Ordering::SeqCst);
        assert!(runner.run(&def, &RunOptions::default()).await.is_err());
        fx.armed.store(false, Ordering::SeqCst);
        let resumed = runner
            .run(
                &def,
                &RunOptions {
                    resume: true,
                    checkpoints: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(resumed.context, full.context);
    }

    #[tokio::test]
    async fn test_resume_without_checkpoint_starts_fresh() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());
        let options = RunOptions {
            resume: true,
            checkpoints: true,
        };

        let result = runner.run(&chain("Recorder"), &options).await.unwrap();
        assert_eq!(result.resumed_from, None);
        assert_eq!(take_log(&fx.log), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fresh_run_clears_stale_checkpoints() {
        let fx = fixture();
        let store = InMemoryCheckpointStore::new();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), store.clone());
        let def = chain("Recorder");

        store
            .save(&CheckpointRecord {
                run_key: "chain-test".to_string(),
                step_index: 7,
                completed_step_id: "ghost".to_string(),
                definition_hash: "stale".to_string(),
                created_at: chrono::Utc::now(),
                context: Default::default(),
            })
            .await
            .unwrap();

        runner.run(&def, &RunOptions::default()).await.unwrap();

        let ids: Vec<String> = store
            .list("chain-test")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.completed_step_id)
            .collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn test_checkpoints_disabled_writes_nothing() {
        let fx = fixture();
        let store = InMemoryCheckpointStore::new();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), store.clone());
        let options = RunOptions {
            resume: false,
            checkpoints: false,
        };

        runner.run(&chain("Recorder"), &options).await.unwrap();
        assert!(store.list("chain-test").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchecked_fresh_run_discards_older_checkpoints() {
        let fx = fixture();
        let store = InMemoryCheckpointStore::new();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), store.clone());
        let def = chain("Flaky");

        // A failed run leaves a checkpoint after s1.
        fx.armed.store(true, Ordering::SeqCst);
        assert!(runner.run(&def, &RunOptions::default()).await.is_err());
        assert_eq!(store.list("chain-test").await.unwrap().len(), 1);
        fx.armed.store(false, Ordering::SeqCst);

        // A newer fresh run without checkpoints replaces that history.
        let unchecked = RunOptions {
            resume: false,
            checkpoints: false,
        };
        runner.run(&def, &unchecked).await.unwrap();
        assert!(store.list("chain-test").await.unwrap().is_empty());
        take_log(&fx.log);

        let resume = RunOptions {
            resume: true,
            checkpoints: true,
        };
        let result = runner.run(&def, &resume).await.unwrap();

        assert_eq!(result.resumed_from, None);
        assert_eq!(take_log(&fx.log), vec!["a", "b", "c"]);
        assert!(result.steps.iter().all(|s| s.status == StepStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_checkpoint_save_failure_does_not_fail_run() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), BrokenStore);

        let result = runner.run(&chain("Recorder"), &RunOptions::default()).await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.checkpoint_warnings.len(), 3);
        assert!(result.checkpoint_warnings[0].contains("disk full"));
    }

    #[tokio::test]
    async fn test_resume_from_unknown_step_fails() {
        let fx = fixture();
        let store = InMemoryCheckpointStore::new();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), store.clone());
        runner.run(&chain("Recorder"), &RunOptions::default()).await.unwrap();
        take_log(&fx.log);

        let mut renamed = chain("Recorder");
        renamed.steps[2].id = "s3-renamed".to_string();
        let resume = RunOptions {
            resume: true,
            checkpoints: true,
        };
        let err = runner.run(&renamed, &resume).await.unwrap_err();

        assert!(matches!(err, RunError::Checkpoint(CheckpointError::UnknownStep { .. })));
        assert!(take_log(&fx.log).is_empty());
    }

    #[tokio::test]
    async fn test_initial_context_seeds_fresh_run() {
        let fx = fixture();
        let runner = WorkflowRunner::new(Arc::clone(&fx.registry), InMemoryCheckpointStore::new());
        let def = WorkflowDefinition {
            name: "seeded".to_string(),
            description: None,
            steps: vec![step("only", "Recorder", Some("seed"), "out")],
        };
        let mut initial = WorkflowContext::new();
        initial.set("seed", json!("s"));

        let result = runner
            .run_with_context(&def, initial, &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(result.context.get_str("out").unwrap(), "s+out");
    }
}
