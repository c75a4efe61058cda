//! The task abstraction: one async capability, `execute(context, config)`.
//!
//! Follows the same blanket-impl pattern as `BoxLlmClient`:
//! 1. `Task` uses RPITIT for an ergonomic async method
//! 2. `TaskDyn` is the object-safe twin with a boxed future
//! 3. `BoxTask` wraps `Box<dyn TaskDyn>` so the registry can hand out
//!    heterogeneous tasks

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use cogflow_types::workflow::{ConfigFieldError, StepConfig};
use serde_json::Value;

use super::batch::BatchError;
use super::context::{ContextError, WorkflowContext};
use crate::llm::LlmError;

// ---------------------------------------------------------------------------
// TaskError
// ---------------------------------------------------------------------------

/// Errors a task can raise from `execute`.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// A required context key was never written by an earlier step.
    #[error("missing required context key '{0}'")]
    MissingKey(String),

    /// The step's config is missing a field or has the wrong shape.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigFieldError),

    /// An input artifact is not what the task expects.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure, with the path involved.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A map or reduce over a collection failed.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// The LLM backend failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Any other unrecoverable failure in the task's own logic.
    #[error("{0}")]
    Failed(String),
}

impl TaskError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ContextError> for TaskError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::MissingKey(key) => TaskError::MissingKey(key),
            other @ ContextError::TypeMismatch { .. } => TaskError::InvalidInput(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Task trait
// ---------------------------------------------------------------------------

/// A unit of work bound to a step type.
///
/// Implementations read inputs with `ctx.get`, write outputs with `ctx.set`,
/// and may return an optional value that the runner records on the step.
/// Tasks must be safe to re-run from scratch, since resume re-executes every
/// step after the last checkpoint.
pub trait Task: Send + Sync {
    fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> impl Future<Output = Result<Option<Value>, TaskError>> + Send;
}

/// Object-safe version of [`Task`] with a boxed future.
pub trait TaskDyn: Send + Sync {
    fn execute_boxed<'a>(
        &'a self,
        ctx: &'a mut WorkflowContext,
        config: &'a StepConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>, TaskError>> + Send + 'a>>;
}

/// Blanket implementation: any `Task` automatically implements `TaskDyn`.
impl<T: Task> TaskDyn for T {
    fn execute_boxed<'a>(
        &'a self,
        ctx: &'a mut WorkflowContext,
        config: &'a StepConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>, TaskError>> + Send + 'a>> {
        Box::pin(self.execute(ctx, config))
    }
}

/// Type-erased task instance, owned by the runner for one step call.
pub struct BoxTask {
    inner: Box<dyn TaskDyn>,
}

impl BoxTask {
    /// Wrap a concrete `Task` in a type-erased box.
    pub fn new<T: Task + 'static>(task: T) -> Self {
        Self {
            inner: Box::new(task),
        }
    }

    pub async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        self.inner.execute_boxed(ctx, config).await
    }
}

impl std::fmt::Debug for BoxTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTask").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
