//! Workflow engine core: context, tasks, batch support, checkpointing, execution.
//!
//! - `context` -- the per-run data bus shared by every step
//! - `task` -- the `Task` trait and its object-safe `BoxTask` wrapper
//! - `registry` -- task type name to factory lookup
//! - `batch` -- map/reduce over context-held collections
//! - `definition` -- YAML parsing and aggregated validation
//! - `checkpoint` -- snapshot after each step, restore on resume
//! - `runner` -- strictly sequential step executor

pub mod batch;
pub mod checkpoint;
pub mod context;
pub mod definition;
pub mod registry;
pub mod runner;
pub mod task;

pub use batch::{
    map_collection, reduce_collection, BatchError, BatchOptions, BatchReport, ErrorPolicy,
    ItemTransform, PersistOptions, ReducePolicy, ReduceTask,
};
pub use checkpoint::{CheckpointError, CheckpointManager, ResumePoint, RunIdentity};
pub use context::{ContextError, WorkflowContext};
pub use definition::{DefinitionError, ValidationErrors, ValidationIssue};
pub use registry::{RegistryError, TaskRegistry};
pub use runner::{ExecutionResult, FailedRun, RunError, RunOptions, WorkflowRunner};
pub use task::{BoxTask, Task, TaskError};
