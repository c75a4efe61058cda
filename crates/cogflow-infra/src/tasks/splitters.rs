//! Splitters: turn one large file into a list of documents.

use std::path::PathBuf;
use std::sync::LazyLock;

use cogflow_core::workflow::context::WorkflowContext;
use cogflow_core::workflow::task::{Task, TaskError};
use cogflow_types::document::Document;
use cogflow_types::workflow::StepConfig;
use regex::Regex;
use serde_json::{json, Value};

use super::write_output;

/// A line of the form `%%% <name>` starts a new section.
static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%%%\s+(.+)$").expect("delimiter pattern is valid"));

/// Splits `input_file` on `%%% <name>` delimiter lines into documents at
/// `output_key` (default `split_docs`).
///
/// Text before the first delimiter is dropped. A file without delimiters
/// becomes a single document named after the file. With `save_to_disk`,
/// each section is also written to `output_dir` (default
/// `./outputs/split_files`).
#[derive(Debug, Default)]
pub struct TextFileSplitterTask;

impl Task for TextFileSplitterTask {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let input_file = PathBuf::from(config.require_str("input_file")?);
        let output_key = config.str_or("output_key", "split_docs")?;
        let save_to_disk = config.bool_or("save_to_disk", false)?;
        let output_dir = PathBuf::from(config.str_or("output_dir", "./outputs/split_files")?);

        let content = tokio::fs::read_to_string(&input_file)
            .await
            .map_err(|e| TaskError::io(&input_file, e))?;
        tracing::info!(input_file = %input_file.display(), "splitting file");

        let mut sections = parse_sections(&content);
        if sections.is_empty() {
            tracing::warn!("no '%%%' delimiters found, treating file as a single document");
            let base_name = input_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sections.push((base_name, content.clone()));
        }

        let mut documents = Vec::with_capacity(sections.len());
        for (position, (name, text)) in sections.into_iter().enumerate() {
            let filename = section_file_name(&name, position);
            if save_to_disk {
                let path = output_dir.join(&filename);
                write_output(&path, &text).await?;
                tracing::debug!(path = %path.display(), "saved split file");
            }
            documents.push(Document::new(filename.clone(), format!("virtual/{filename}"), text));
        }

        let count = documents.len();
        let value = serde_json::to_value(&documents)
            .map_err(|e| TaskError::Failed(format!("failed to encode documents: {e}")))?;
        ctx.set(output_key, value);
        tracing::info!(output_key, documents = count, "splitter produced documents");

        Ok(Some(json!({ "documents": count })))
    }
}

/// Split `content` into `(name, text)` sections. Section text is trimmed.
///
/// A trailing section with no lines after its delimiter is dropped.
pub fn parse_sections(content: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = DELIMITER.captures(line) {
            if let Some(name) = current.take() {
                sections.push((name, buffer.join("\n").trim().to_string()));
            }
            current = Some(caps[1].trim().to_string());
            buffer.clear();
        } else if current.is_some() {
            buffer.push(line);
        }
    }

    if let Some(name) = current {
        if !buffer.is_empty() {
            sections.push((name, buffer.join("\n").trim().to_string()));
        }
    }
    sections
}

/// Keep alphanumerics, `_`, `-` and spaces.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect()
}

/// Sanitized section name with a `.txt` extension.
fn section_file_name(name: &str, position: usize) -> String {
    let stem = name.strip_suffix(".txt").unwrap_or(name);
    let stem = sanitize_file_name(stem);
    let stem = stem.trim();
    if stem.is_empty() {
        format!("section_{:03}.txt", position + 1)
    } else {
        format!("{stem}.txt")
    }
}
