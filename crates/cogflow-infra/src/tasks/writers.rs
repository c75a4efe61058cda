//! Writers: render context artifacts into files.

use std::path::PathBuf;

use cogflow_core::workflow::context::WorkflowContext;
use cogflow_core::workflow::task::{Task, TaskError};
use cogflow_types::workflow::StepConfig;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{value_text, write_output};

/// One `## <title>` section of a report.
#[derive(Debug, Clone, Deserialize)]
struct ReportSection {
    #[serde(default)]
    title: Option<String>,
    content_key: String,
}

#[derive(Debug, Deserialize)]
struct ReportSettings {
    filename: String,
    #[serde(default)]
    sections: Vec<ReportSection>,
    #[serde(default)]
    output_key: Option<String>,
}

/// Writes a markdown report made of titled sections, each pulled from a
/// context key.
///
/// A section whose key is absent renders a visible placeholder rather than
/// failing the step. When `output_key` is set, the report path is stored
/// there.
#[derive(Debug, Default)]
pub struct ReportWriterTask;

impl Task for ReportWriterTask {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        // Report a missing filename by name before the general parse.
        config.require_str("filename")?;
        let settings: ReportSettings = config.parse()?;

        let report = render_report(ctx, &settings.sections);
        let path = PathBuf::from(&settings.filename);
        write_output(&path, &report).await?;
        tracing::info!(path = %path.display(), sections = settings.sections.len(), "report written");

        let path_text = path.display().to_string();
        if let Some(key) = &settings.output_key {
            ctx.set(key.as_str(), json!(path_text));
        }
        Ok(Some(json!({ "path": path_text, "sections": settings.sections.len() })))
    }
}

fn render_report(ctx: &WorkflowContext, sections: &[ReportSection]) -> String {
    let mut parts = Vec::with_capacity(sections.len() * 3);
    for section in sections {
        if let Some(title) = &section.title {
            parts.push(format!("## {title}"));
        }
        let content = if ctx.has(&section.content_key) {
            ctx.get(&section.content_key).map(value_text).unwrap_or_default()
        } else {
            tracing::warn!(key = section.content_key.as_str(), "report section key missing");
            format!("_[Missing content for key: {}]_", section.content_key)
        };
        parts.push(content);
        parts.push("\n---\n".to_string());
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sections() -> Value {
        json!([
            {"title": "Summary", "content_key": "summary"},
            {"title": "Plan", "content_key": "plan"},
            {"content_key": "raw"},
        ])
    }

    async fn write(ctx: &mut WorkflowContext, config: &StepConfig) -> Value {
        ReportWriterTask.execute(ctx, config).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_writes_sections_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("final.md");

        let mut ctx = WorkflowContext::new();
        ctx.set("summary", json!("short"));
        ctx.set("plan", json!("1. go"));
        ctx.set("raw", json!({"n": 1}));
        let config = StepConfig::new()
            .with("filename", path.to_str().unwrap())
            .with("sections", sections())
            .with("output_key", "report_path");

        let output = write(&mut ctx, &config).await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "## Summary\n\nshort\n\n\n---\n\n\n## Plan\n\n1. go\n\n\n---\n\n\n{\"n\":1}\n\n\n---\n"
        );
        assert_eq!(ctx.get_str("report_path").unwrap(), path.to_str().unwrap());
        assert_eq!(output["sections"], 3);
    }

    #[tokio::test]
    async fn test_missing_key_renders_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.md");

        let mut ctx = WorkflowContext::new();
        ctx.set("summary", json!("short"));
        let config = StepConfig::new()
            .with("filename", path.to_str().unwrap())
            .with("sections", sections());

        write(&mut ctx, &config).await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("_[Missing content for key: plan]_"));
        assert!(text.contains("_[Missing content for key: raw]_"));
        assert!(!ctx.has("report_path"));
    }

    #[tokio::test]
    async fn test_requires_filename() {
        let mut ctx = WorkflowContext::new();
        let err = ReportWriterTask
            .execute(&mut ctx, &StepConfig::new().with("sections", sections()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("filename"));
    }
}
