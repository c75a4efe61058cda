//! Workflow domain types for Cogflow.
//!
//! Two representations of a workflow live here:
//! - `WorkflowDocument` -- the lenient shape read straight from YAML, where
//!   every field is optional so that validation can report all problems at once.
//! - `WorkflowDefinition` -- the validated, immutable step list the runner
//!   executes in declaration order.
//!
//! This module also contains execution tracking types (`StepRecord`,
//! `StepStatus`, `RunStatus`) and the persisted `CheckpointRecord`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Workflow Document (raw YAML shape)
// ---------------------------------------------------------------------------

/// A workflow document as written by the user, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Human-readable workflow name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered step list.
    #[serde(default)]
    pub steps: Vec<StepDocument>,
}

/// A single step as written by the user, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Kept as a raw value so a non-mapping `config` is reported, not rejected by serde.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

// ---------------------------------------------------------------------------
// Workflow Definition (validated)
// ---------------------------------------------------------------------------

/// A validated workflow: a name plus an ordered, immutable list of steps.
///
/// Declaration order is execution order. There is no dependency inference
/// and no reordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    /// Position of a step in declaration order.
    pub fn position_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }
}

/// A single step: `{id, type, config}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique within the workflow; used for logging and checkpoint naming.
    pub id: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Registry key of the task that executes this step.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Opaque task configuration, passed verbatim to the task.
    #[serde(default)]
    pub config: StepConfig,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, task_type: impl Into<String>, config: StepConfig) -> Self {
        Self {
            id: id.into(),
            name: None,
            task_type: task_type.into(),
            config,
        }
    }
}

// ---------------------------------------------------------------------------
// Step Config
// ---------------------------------------------------------------------------

/// Opaque step configuration mapping.
///
/// The runner never interprets these contents. Tasks read their own fields
/// through the typed accessors below, which fail with a [`ConfigFieldError`]
/// naming the offending field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepConfig(pub Map<String, Value>);

impl StepConfig {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a config from a JSON value; anything but an object yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Builder-style insert, mostly for programmatic definitions and tests.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// A required, non-empty string field.
    pub fn require_str(&self, field: &str) -> Result<&str, ConfigFieldError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Err(ConfigFieldError::Missing(field.to_string())),
            Some(Value::String(s)) if s.is_empty() => {
                Err(ConfigFieldError::Missing(field.to_string()))
            }
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ConfigFieldError::WrongType {
                field: field.to_string(),
                expected: "string",
            }),
        }
    }

    /// An optional string field.
    pub fn opt_str(&self, field: &str) -> Result<Option<&str>, ConfigFieldError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ConfigFieldError::WrongType {
                field: field.to_string(),
                expected: "string",
            }),
        }
    }

    pub fn str_or<'a>(&'a self, field: &str, default: &'a str) -> Result<&'a str, ConfigFieldError> {
        Ok(self.opt_str(field)?.unwrap_or(default))
    }

    pub fn bool_or(&self, field: &str, default: bool) -> Result<bool, ConfigFieldError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ConfigFieldError::WrongType {
                field: field.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Deserialize the whole mapping into a task-specific settings struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ConfigFieldError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ConfigFieldError::Invalid(e.to_string()))
    }
}

impl From<Map<String, Value>> for StepConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A step config field was missing or had the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigFieldError {
    #[error("missing required config field '{0}'")]
    Missing(String),

    #[error("config field '{field}' must be a {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Execution tracking
// ---------------------------------------------------------------------------

/// Lifecycle of one step within a run.
///
/// `Pending -> Running -> {Succeeded, Failed}`; `Skipped` marks steps covered
/// by the checkpoint a run resumed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// Terminal (or current) state of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// What happened to a single step during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    pub task_type: String,
    pub status: StepStatus,
    /// Wall-clock duration of `execute`, zero for skipped steps.
    pub duration_ms: u64,
    /// The optional value returned by the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

// ---------------------------------------------------------------------------
// Checkpoint record
// ---------------------------------------------------------------------------

/// A snapshot taken after a step fully succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Identity of the run this snapshot belongs to.
    pub run_key: String,
    /// Declaration index of the completed step.
    pub step_index: usize,
    pub completed_step_id: String,
    /// Fingerprint of the ordered `(id, type)` list when the snapshot was taken.
    pub definition_hash: String,
    pub created_at: DateTime<Utc>,
    /// Full Context contents after the step.
    pub context: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_parses_lenient_yaml() {
        let yaml = r#"
name: summarize-notes
steps:
  - id: load
    type: DirectoryLoader
    config:
      input_path: "./inputs/*.txt"
      output_key: raw_files
  - id: broken
"#;
        let doc: WorkflowDocument = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(doc.name.as_deref(), Some("summarize-notes"));
        assert_eq!(doc.steps.len(), 2);
        assert_eq!(doc.steps[0].task_type.as_deref(), Some("DirectoryLoader"));
        assert!(doc.steps[1].task_type.is_none());
        assert!(doc.steps[1].config.is_none());
    }

    #[test]
    fn test_step_definition_uses_type_key() {
        let step = StepDefinition::new("load", "DirectoryLoader", StepConfig::new());
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], json!("DirectoryLoader"));
        assert!(value.get("task_type").is_none());
    }

    #[test]
    fn test_config_require_str() {
        let cfg = StepConfig::new()
            .with("input_key", "docs")
            .with("empty", "")
            .with("count", 3);

        assert_eq!(cfg.require_str("input_key").unwrap(), "docs");
        assert_eq!(
            cfg.require_str("missing").unwrap_err(),
            ConfigFieldError::Missing("missing".to_string())
        );
        assert_eq!(
            cfg.require_str("empty").unwrap_err(),
            ConfigFieldError::Missing("empty".to_string())
        );
        assert!(matches!(
            cfg.require_str("count").unwrap_err(),
            ConfigFieldError::WrongType { .. }
        ));
    }

    #[test]
    fn test_config_defaults() {
        let cfg = StepConfig::new().with("save", true).with("limit", 4);
        assert!(cfg.bool_or("save", false).unwrap());
        assert!(!cfg.bool_or("other", false).unwrap());
        assert!(cfg.bool_or("limit", false).is_err());
        assert_eq!(cfg.str_or("model", "default").unwrap(), "default");
    }

    #[test]
    fn test_config_parse_into_struct() {
        #[derive(Debug, Deserialize)]
        struct Settings {
            separator: String,
            #[serde(default)]
            save_to_file: Option<String>,
        }

        let cfg = StepConfig::new().with("separator", " | ");
        let settings: Settings = cfg.parse().unwrap();
        assert_eq!(settings.separator, " | ");
        assert!(settings.save_to_file.is_none());

        let err = StepConfig::new().parse::<Settings>().unwrap_err();
        assert!(err.to_string().contains("separator"), "got: {err}");
    }

    #[test]
    fn test_config_from_value_rejects_non_object() {
        assert!(StepConfig::from_value(json!({"a": 1})).is_some());
        assert!(StepConfig::from_value(json!(["a"])).is_none());
        assert!(StepConfig::from_value(json!("text")).is_none());
    }

    #[test]
    fn test_checkpoint_record_serde_roundtrip() {
        let mut context = BTreeMap::new();
        context.insert("summary".to_string(), json!("text"));
        context.insert("docs".to_string(), json!([{"filename": "a.txt"}]));

        let record = CheckpointRecord {
            run_key: "notes".to_string(),
            step_index: 1,
            completed_step_id: "summarize".to_string(),
            definition_hash: "abc".to_string(),
            created_at: Utc::now(),
            context,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: CheckpointRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(serde_json::to_value(StepStatus::Succeeded).unwrap(), json!("succeeded"));
        assert_eq!(serde_json::to_value(RunStatus::Aborted).unwrap(), json!("aborted"));
        assert_eq!(RunStatus::Completed.to_string(), "completed");
    }
}
