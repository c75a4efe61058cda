//! LLM-backed transformers: a single-value transform and a batch map over documents.
//!
//! Both load a prompt template from `prompt_file`, substitute `{content}`,
//! query the configured LLM client, and prefix the result with a metadata
//! section.

use std::path::Path;
use std::sync::Arc;

use cogflow_core::llm::BoxLlmClient;
use cogflow_core::workflow::batch::{map_collection, BatchOptions, ItemTransform};
use cogflow_core::workflow::context::WorkflowContext;
use cogflow_core::workflow::task::{Task, TaskError};
use cogflow_types::llm::LlmCall;
use cogflow_types::workflow::StepConfig;
use serde_json::{json, Value};

use super::{value_text, TaskDeps};

/// Placeholder in prompt templates replaced by the input text.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

// ---------------------------------------------------------------------------
// Prompt helpers
// ---------------------------------------------------------------------------

/// Read a prompt template.
pub async fn load_prompt(path: &Path) -> Result<String, TaskError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TaskError::io(path, e))
}

/// Substitute every `{content}` in `template`.
pub fn render_prompt(template: &str, content: &str) -> String {
    template.replace(CONTENT_PLACEHOLDER, content)
}

/// The `## Metadata` block placed above LLM output.
fn metadata_section(date: &str, source: Option<&str>, model: &str, prompt_file: &str) -> String {
    let mut section = format!("## Metadata\n- **Date:** {date}\n");
    if let Some(source) = source {
        section.push_str(&format!("- **Source:** {source}\n"));
    }
    section.push_str(&format!("- **Model:** {model}\n- **Prompt:** {prompt_file}\n\n"));
    section
}

fn today() -> String {
    chrono::Local::now().format("%d-%m-%Y").to_string()
}

// ---------------------------------------------------------------------------
// LLMTransformTask
// ---------------------------------------------------------------------------

/// Applies a prompt to the single value at `input_key` and writes the
/// annotated response to `output_key`.
#[derive(Debug)]
pub struct LlmTransformTask {
    deps: TaskDeps,
}

impl LlmTransformTask {
    pub fn new(deps: TaskDeps) -> Self {
        Self { deps }
    }
}

impl Task for LlmTransformTask {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let input_key = config.require_str("input_key")?;
        let output_key = config.require_str("output_key")?;
        let prompt_file = config.require_str("prompt_file")?;
        let model = config.str_or("model", &self.deps.default_model)?;

        let input = value_text(ctx.get(input_key)?);
        let template = load_prompt(Path::new(prompt_file)).await?;
        let prompt = render_prompt(&template, &input);

        tracing::info!(input_key, model, "generating transformation");
        let response = self.deps.llm.query(&prompt, model).await?;

        let output = format!(
            "{}## LLM Processed Content\n\n{response}",
            metadata_section(&today(), None, model, prompt_file)
        );
        ctx.set(output_key, json!(output));

        let call = LlmCall {
            model: model.to_string(),
            prompt_chars: prompt.chars().count(),
            response_chars: response.chars().count(),
        };
        Ok(Some(json!(call)))
    }
}

// ---------------------------------------------------------------------------
// BatchLLMTask
// ---------------------------------------------------------------------------

/// Maps a prompt over the documents at `input_key`, writing one annotated
/// result per document to `output_key`.
///
/// Honours every batch option (`concurrency`, `on_error`,
/// `save_intermediate_files`, `output_dir`, `filename_suffix`,
/// `file_extension`, `fail_on_persist_error`). With `on_error: continue`, a
/// failed document yields `[Error processing <filename>]` in place of the
/// model response.
#[derive(Debug)]
pub struct BatchLlmTask {
    deps: TaskDeps,
}

impl BatchLlmTask {
    pub fn new(deps: TaskDeps) -> Self {
        Self { deps }
    }
}

impl Task for BatchLlmTask {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let input_key = config.require_str("input_key")?;
        let output_key = config.require_str("output_key")?;
        let prompt_file = config.require_str("prompt_file")?;
        let model = config.str_or("model", &self.deps.default_model)?;
        let include_original = config.bool_or("include_original_content", true)?;
        let options =
            BatchOptions::from_config(config, self.deps.batch_concurrency, &self.deps.output_dir)?;

        let template = load_prompt(Path::new(prompt_file)).await?;
        let transform = DocumentPrompt {
            llm: Arc::clone(&self.deps.llm),
            template,
            model: model.to_string(),
            prompt_file: prompt_file.to_string(),
            date: today(),
            include_original,
        };

        let report = map_collection(ctx, input_key, output_key, transform, &options).await?;
        Ok(Some(report.to_value()))
    }
}

/// Per-document transform used by [`BatchLlmTask`].
struct DocumentPrompt {
    llm: Arc<BoxLlmClient>,
    template: String,
    model: String,
    prompt_file: String,
    date: String,
    include_original: bool,
}

impl DocumentPrompt {
    fn fields(item: &Value) -> (&str, &str) {
        match item {
            Value::String(content) => ("unknown", content.as_str()),
            other => (
                other.get("filename").and_then(Value::as_str).unwrap_or("unknown"),
                other.get("content").and_then(Value::as_str).unwrap_or(""),
            ),
        }
    }

    fn compose(&self, filename: &str, content: &str, response: &str) -> String {
        let metadata = metadata_section(&self.date, Some(filename), &self.model, &self.prompt_file);
        if self.include_original {
            format!(
                "{metadata}## LLM Processed Content\n\n{response}\n\n---\n\n## Original Content\n\n{content}"
            )
        } else {
            format!("{metadata}## LLM Processed Content\n\n{response}")
        }
    }
}

impl ItemTransform for DocumentPrompt {
    async fn transform(&self, index: usize, item: &Value) -> Result<Value, TaskError> {
        let (filename, content) = Self::fields(item);
        tracing::info!(index, filename, "processing item");

        let prompt = render_prompt(&self.template, content);
        let response = self.llm.query(&prompt, &self.model).await?;
        Ok(json!(self.compose(filename, content, &response)))
    }

    fn fallback(&self, _index: usize, item: &Value, _error: &TaskError) -> Value {
        let (filename, content) = Self::fields(item);
        json!(self.compose(filename, content, &format!("[Error processing {filename}]")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
