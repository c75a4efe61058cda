//! Loaders: bring files from disk into the context.

use cogflow_core::workflow::context::WorkflowContext;
use cogflow_core::workflow::task::{Task, TaskError};
use cogflow_types::document::Document;
use cogflow_types::workflow::{ConfigFieldError, StepConfig};
use serde_json::{json, Value};

use crate::filesystem::glob::{self, GlobError};

/// Loads every file matching `input_path` (e.g. `./inputs/*.txt`) as a
/// list of [`Document`]s at `output_key` (default `raw_files`).
///
/// Files are sorted by path. Unreadable files are logged and skipped.
#[derive(Debug, Default)]
pub struct DirectoryLoader;

impl Task for DirectoryLoader {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let pattern = config.require_str("input_path")?;
        let output_key = config.str_or("output_key", "raw_files")?;

        let paths = glob::expand(pattern).await.map_err(|e| match e {
            GlobError::Io { dir, source } => TaskError::io(dir, source),
            other => TaskError::InvalidConfig(ConfigFieldError::Invalid(other.to_string())),
        })?;
        tracing::info!(pattern, matched = paths.len(), "directory loader found files");

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    documents.push(Document::new(filename, path.display().to_string(), content));
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to read file, skipping");
                }
            }
        }

        let loaded = documents.len();
        let value = serde_json::to_value(&documents)
            .map_err(|e| TaskError::Failed(format!("failed to encode documents: {e}")))?;
        ctx.set(output_key, value);
        tracing::info!(output_key, loaded, "loaded files into context");

        Ok(Some(json!({ "matched": paths.len(), "loaded": loaded })))
    }
}
