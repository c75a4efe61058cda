//! Workflow definition parsing and validation.
//!
//! Converts a YAML document into the validated `WorkflowDefinition` the
//! runner executes. Validation collects every problem in the document (missing
//! fields, duplicate step ids, unknown task types) and reports them together,
//! so a broken file can be fixed in one pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cogflow_types::workflow::{StepConfig, StepDefinition, WorkflowDefinition, WorkflowDocument};
use serde_json::Value;
use thiserror::Error;

use super::registry::TaskRegistry;

/// Name given to workflows whose document has no `name`.
pub const DEFAULT_WORKFLOW_NAME: &str = "unnamed-workflow";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from loading a workflow definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// YAML/JSON syntax or shape error.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to read workflow file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document parsed but is not a runnable workflow.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// One problem found while validating a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("workflow must have at least one step")]
    EmptyWorkflow,

    #[error("step {} is missing required field '{field}'", .index + 1)]
    MissingField { index: usize, field: &'static str },

    #[error("step '{step_id}': config must be a mapping, found {found}")]
    InvalidConfig { step_id: String, found: String },

    #[error("duplicate step id '{step_id}' (steps {} and {})", .first_index + 1, .index + 1)]
    DuplicateStepId {
        step_id: String,
        first_index: usize,
        index: usize,
    },

    #[error("step '{step_id}': unknown task type '{task_type}'{}", did_you_mean(.suggestion))]
    UnknownTaskType {
        step_id: String,
        task_type: String,
        suggestion: Option<String>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

/// Every validation issue in a workflow, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(issues: Vec<ValidationIssue>) -> Result<(), ValidationErrors> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(issues))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "workflow has {count} validation error{}",
            if count == 1 { "" } else { "s" }
        )?;
        for issue in &self.0 {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse YAML (or JSON) into the raw document shape without validating it.
pub fn parse_workflow_document(yaml: &str) -> Result<WorkflowDocument, DefinitionError> {
    serde_yaml_ng::from_str(yaml).map_err(|e| DefinitionError::Parse(e.to_string()))
}

/// Parse and validate a workflow against the task types in `registry`.
pub fn parse_workflow_yaml(
    yaml: &str,
    registry: &TaskRegistry,
) -> Result<WorkflowDefinition, DefinitionError> {
    let document = parse_workflow_document(yaml)?;
    build_definition(document, registry)
}

/// Load and validate a workflow file.
pub async fn load_workflow_file(
    path: &Path,
    registry: &TaskRegistry,
) -> Result<WorkflowDefinition, DefinitionError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_workflow_yaml(&content, registry)
}

/// Turn a raw document into a definition, collecting every issue.
///
/// `id` and `type` are required on each step; a missing or null `config`
/// becomes an empty mapping. A missing workflow name defaults to
/// [`DEFAULT_WORKFLOW_NAME`].
pub fn build_definition(
    document: WorkflowDocument,
    registry: &TaskRegistry,
) -> Result<WorkflowDefinition, DefinitionError> {
    let name = match document.name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => {
            tracing::warn!(default = DEFAULT_WORKFLOW_NAME, "workflow has no name, using default");
            DEFAULT_WORKFLOW_NAME.to_string()
        }
    };

    let mut issues = Vec::new();
    if document.steps.is_empty() {
        issues.push(ValidationIssue::EmptyWorkflow);
    }

    let mut seen = HashMap::new();
    let mut steps = Vec::with_capacity(document.steps.len());

    for (index, raw) in document.steps.into_iter().enumerate() {
        let id = raw.id.filter(|s| !s.is_empty());
        let task_type = raw.task_type.filter(|s| !s.is_empty());

        if id.is_none() {
            issues.push(ValidationIssue::MissingField { index, field: "id" });
        }
        if task_type.is_none() {
            issues.push(ValidationIssue::MissingField { index, field: "type" });
        }

        let label = id.clone().unwrap_or_else(|| format!("#{}", index + 1));
        let config = match raw.config {
            None | Some(Value::Null) => Some(StepConfig::new()),
            Some(value) => {
                let found = describe(&value);
                let config = StepConfig::from_value(value);
                if config.is_none() {
                    issues.push(ValidationIssue::InvalidConfig {
                        step_id: label.clone(),
                        found,
                    });
                }
                config
            }
        };

        if let Some(id) = &id {
            check_step_id(id, index, &mut seen, &mut issues);
        }
        if let Some(task_type) = &task_type {
            check_task_type(&label, task_type, registry, &mut issues);
        }

        if let (Some(id), Some(task_type), Some(config)) = (id, task_type, config) {
            steps.push(StepDefinition {
                id,
                name: raw.name,
                task_type,
                config,
            });
        }
    }

    ValidationErrors::into_result(issues)?;

    tracing::debug!(workflow = name.as_str(), steps = steps.len(), "workflow definition parsed");
    Ok(WorkflowDefinition {
        name,
        description: document.description,
        steps,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an already-built definition: at least one step, unique ids,
/// every type registered.
pub fn validate_definition(
    def: &WorkflowDefinition,
    registry: &TaskRegistry,
) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    if def.steps.is_empty() {
        issues.push(ValidationIssue::EmptyWorkflow);
    }

    let mut seen = HashMap::new();
    for (index, step) in def.steps.iter().enumerate() {
        if step.id.is_empty() {
            issues.push(ValidationIssue::MissingField { index, field: "id" });
        } else {
            check_step_id(&step.id, index, &mut seen, &mut issues);
        }
        if step.task_type.is_empty() {
            issues.push(ValidationIssue::MissingField { index, field: "type" });
        } else {
            check_task_type(&step.id, &step.task_type, registry, &mut issues);
        }
    }

    ValidationErrors::into_result(issues)
}

fn check_step_id(
    id: &str,
    index: usize,
    seen: &mut HashMap<String, usize>,
    issues: &mut Vec<ValidationIssue>,
) {
    match seen.get(id) {
        Some(&first_index) => issues.push(ValidationIssue::DuplicateStepId {
            step_id: id.to_string(),
            first_index,
            index,
        }),
        None => {
            seen.insert(id.to_string(), index);
        }
    }
}

fn check_task_type(
    step_id: &str,
    task_type: &str,
    registry: &TaskRegistry,
    issues: &mut Vec<ValidationIssue>,
) {
    if !registry.contains(task_type) {
        issues.push(ValidationIssue::UnknownTaskType {
            step_id: step_id.to_string(),
            task_type: task_type.to_string(),
            suggestion: registry.suggest(task_type).map(str::to_string),
        });
    }
}

fn describe(value: &Value) -> String {
    super::context::kind_of(value).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
