//! Aggregators: reduce a list of artifacts into a single text.

use std::path::PathBuf;

use cogflow_core::workflow::batch::{reduce_collection, ReducePolicy, DEFAULT_SEPARATOR};
use cogflow_core::workflow::context::WorkflowContext;
use cogflow_core::workflow::task::{Task, TaskError};
use cogflow_types::workflow::StepConfig;
use serde_json::{json, Value};

use super::write_output;

/// Joins the list at `input_key` with `separator` into `output_key`.
///
/// An empty list yields an empty string. With `save_to_file` set, the joined
/// text is also written to that path.
#[derive(Debug, Default)]
pub struct TextAggregator;

impl Task for TextAggregator {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let input_key = config.require_str("input_key")?;
        let output_key = config.require_str("output_key")?;
        let separator = config.str_or("separator", DEFAULT_SEPARATOR)?;
        let save_to_file = config.opt_str("save_to_file")?.map(PathBuf::from);

        // Fail with a type error before touching the output key.
        ctx.get_array(input_key)?;

        let policy = ReducePolicy::Concatenate {
            separator: separator.to_string(),
        };
        let items = reduce_collection(ctx, input_key, output_key, &policy)?;
        let combined = ctx.get_str(output_key)?;
        let chars = combined.chars().count();

        if let Some(path) = &save_to_file {
            write_output(path, combined).await?;
            tracing::info!(path = %path.display(), "saved aggregated text");
        }

        tracing::info!(output_key, items, chars, "aggregated text");
        Ok(Some(json!({ "items": items, "chars": chars })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_joins_with_default_separator() {
        let mut ctx = WorkflowContext::new();
        ctx.set("parts", json!(["one", "two", "three"]));
        let config = StepConfig::new()
            .with("input_key", "parts")
            .with("output_key", "joined");

        let output = TextAggregator.execute(&mut ctx, &config).await.unwrap();

        assert_eq!(
            ctx.get_str("joined").unwrap(),
            "one\n\n---\n\ntwo\n\n---\n\nthree"
        );
        assert_eq!(output.unwrap()["items"], 3);
    }

    #[tokio::test]
    async fn test_empty_list_is_empty_string() {
        let mut ctx = WorkflowContext::new();
        ctx.set("parts", json!([]));
        let config = StepConfig::new()
            .with("input_key", "parts")
            .with("output_key", "joined");

        TextAggregator.execute(&mut ctx, &config).await.unwrap();
        assert_eq!(ctx.get_str("joined").unwrap(), "");
    }

    #[tokio::test]
    async fn test_non_list_input_is_rejected() {
        let mut ctx = WorkflowContext::new();
        ctx.set("parts", json!("already text"));
        let config = StepConfig::new()
            .with("input_key", "parts")
            .with("output_key", "joined");

        let err = TextAggregator.execute(&mut ctx, &config).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));
        assert!(!ctx.has("joined"));
    }

    #[tokio::test]
    async fn test_custom_separator_and_save_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("combined.md");

        let mut ctx = WorkflowContext::new();
        ctx.set("parts", json!(["a", "b"]));
        let config = StepConfig::new()
            .with("input_key", "parts")
            .with("output_key", "joined")
            .with("separator", " | ")
            .with("save_to_file", path.to_str().unwrap());

        TextAggregator.execute(&mut ctx, &config).await.unwrap();
        assert_eq!(ctx.get_str("joined").unwrap(), "a | b");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a | b");
    }
}
