//! Application state wiring the engine together for CLI commands.
//!
//! AppState resolves the data directory, loads `cogflow.toml`, applies CLI
//! overrides, and builds the task registry and checkpoint store that every
//! command shares.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cogflow_core::workflow::registry::TaskRegistry;
use cogflow_core::workflow::runner::WorkflowRunner;
use cogflow_infra::config::{load_engine_config, resolve_checkpoint_dir};
use cogflow_infra::filesystem::checkpoint::FileCheckpointStore;
use cogflow_infra::filesystem::resolve_data_dir;
use cogflow_infra::tasks::{builtin_registry, TaskDeps};
use cogflow_types::config::EngineConfig;

/// Runner pinned to the filesystem checkpoint store.
pub type ConcreteRunner = WorkflowRunner<FileCheckpointStore>;

/// Values from the command line that take precedence over `cogflow.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub checkpoint_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
}

/// Shared state for one CLI invocation.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub checkpoint_dir: PathBuf,
    pub registry: Arc<TaskRegistry>,
}

impl AppState {
    /// Load configuration and build the built-in task registry.
    pub async fn init(overrides: Overrides) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let mut config = load_engine_config(&data_dir).await;

        if let Some(dir) = overrides.checkpoint_dir {
            config.checkpoint_dir = Some(dir);
        }
        if let Some(concurrency) = overrides.concurrency {
            anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
            config.batch_concurrency = concurrency;
        }

        let checkpoint_dir = resolve_checkpoint_dir(&config, &data_dir);
        let deps = TaskDeps::from_config(&config).context("Failed to configure LLM client")?;
        let registry = builtin_registry(&deps).context("Failed to register built-in tasks")?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            checkpoint_dir = %checkpoint_dir.display(),
            llm_provider = config.llm_provider.as_str(),
            "application state ready"
        );

        Ok(Self {
            data_dir,
            config,
            checkpoint_dir,
            registry: Arc::new(registry),
        })
    }

    /// A runner that checkpoints under the resolved checkpoint directory.
    pub fn runner(&self) -> ConcreteRunner {
        WorkflowRunner::new(
            Arc::clone(&self.registry),
            FileCheckpointStore::new(&self.checkpoint_dir),
        )
    }
}
