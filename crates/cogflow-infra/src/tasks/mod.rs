//! Built-in task implementations and their registration.
//!
//! | Type name              | Task                     |
//! |------------------------|--------------------------|
//! | `DirectoryLoader`      | [`DirectoryLoader`]      |
//! | `TextFileSplitterTask` | [`TextFileSplitterTask`] |
//! | `LLMTransformTask`     | [`LlmTransformTask`]     |
//! | `BatchLLMTask`         | [`BatchLlmTask`]         |
//! | `TextAggregator`       | [`TextAggregator`]       |
//! | `ReportWriterTask`     | [`ReportWriterTask`]     |
//! | `Reduce`               | `ReduceTask` (core)      |

pub mod aggregators;
pub mod loaders;
pub mod splitters;
pub mod transformers;
pub mod writers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cogflow_core::llm::BoxLlmClient;
use cogflow_core::workflow::batch::ReduceTask;
use cogflow_core::workflow::registry::{RegistryError, TaskRegistry};
use cogflow_core::workflow::task::{BoxTask, TaskError};
use cogflow_types::config::EngineConfig;
use cogflow_types::llm::LlmError;
use serde_json::Value;

pub use aggregators::TextAggregator;
pub use loaders::DirectoryLoader;
pub use splitters::TextFileSplitterTask;
pub use transformers::{BatchLlmTask, LlmTransformTask};
pub use writers::ReportWriterTask;

use crate::filesystem::write_text;
use crate::llm::build_llm_client;

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Shared collaborators handed to tasks that need more than their config.
#[derive(Debug, Clone)]
pub struct TaskDeps {
    pub llm: Arc<BoxLlmClient>,
    /// Model used when a step sets no `model`.
    pub default_model: String,
    /// Batch concurrency used when a step sets no `concurrency`.
    pub batch_concurrency: usize,
    /// Output directory used when a step sets no `output_dir`.
    pub output_dir: PathBuf,
}

impl TaskDeps {
    /// Dependencies with engine defaults around the given client.
    pub fn new(llm: BoxLlmClient) -> Self {
        let defaults = EngineConfig::default();
        Self {
            llm: Arc::new(llm),
            default_model: defaults.default_model,
            batch_concurrency: defaults.batch_concurrency,
            output_dir: defaults.output_dir,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, LlmError> {
        Ok(Self {
            llm: Arc::new(build_llm_client(&config.llm_provider)?),
            default_model: config.default_model.clone(),
            batch_concurrency: config.batch_concurrency.max(1),
            output_dir: config.output_dir.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every built-in task type.
pub fn register_builtin_tasks(
    registry: &mut TaskRegistry,
    deps: &TaskDeps,
) -> Result<(), RegistryError> {
    registry.register_task::<DirectoryLoader>("DirectoryLoader")?;
    registry.register_task::<TextFileSplitterTask>("TextFileSplitterTask")?;

    let transform_deps = deps.clone();
    registry.register("LLMTransformTask", move || {
        BoxTask::new(LlmTransformTask::new(transform_deps.clone()))
    })?;

    let batch_deps = deps.clone();
    registry.register("BatchLLMTask", move || {
        BoxTask::new(BatchLlmTask::new(batch_deps.clone()))
    })?;

    registry.register_task::<TextAggregator>("TextAggregator")?;
    registry.register_task::<ReportWriterTask>("ReportWriterTask")?;
    registry.register_task::<ReduceTask>("Reduce")?;

    tracing::debug!(task_types = registry.len(), "registered built-in tasks");
    Ok(())
}

/// A registry holding exactly the built-in task types.
pub fn builtin_registry(deps: &TaskDeps) -> Result<TaskRegistry, RegistryError> {
    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, deps)?;
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Helpers shared by tasks
// ---------------------------------------------------------------------------

/// Text form of an artifact: strings as-is, anything else as compact JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write a task output file, attaching the path to any I/O error.
pub(crate) async fn write_output(path: &Path, content: &str) -> Result<(), TaskError> {
    write_text(path, content)
        .await
        .map_err(|e| TaskError::io(path, e))
}
