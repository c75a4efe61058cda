//! Workflow execution context: the data bus threaded through every step.
//!
//! `WorkflowContext` is a string-keyed store of JSON artifacts scoped to a
//! single run. It is the only channel between steps. Reads of absent keys
//! fail with [`ContextError::MissingKey`]; `set` is the only mutation and
//! nothing is ever removed implicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// ContextError
// ---------------------------------------------------------------------------

/// Errors from reading the context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The key was never written by an earlier step.
    #[error("missing required context key '{0}'")]
    MissingKey(String),

    /// The key exists but holds a different kind of artifact.
    #[error("context key '{key}' must hold {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

// ---------------------------------------------------------------------------
// WorkflowContext
// ---------------------------------------------------------------------------

/// Mutable key-value store shared by all steps of one run.
///
/// Values are `serde_json::Value`, which covers text, lists, structured
/// records and paths, and survives a JSON checkpoint without loss. Keys are
/// kept sorted so snapshots are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowContext {
    entries: BTreeMap<String, Value>,
}

impl WorkflowContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-populated with entries (e.g. from a checkpoint).
    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Read a key, failing if it was never written.
    pub fn get(&self, key: &str) -> Result<&Value, ContextError> {
        self.entries
            .get(key)
            .ok_or_else(|| ContextError::MissingKey(key.to_string()))
    }

    /// Read a key that must hold a string.
    pub fn get_str(&self, key: &str) -> Result<&str, ContextError> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(ContextError::TypeMismatch {
                key: key.to_string(),
                expected: "text",
                found: kind_of(other),
            }),
        }
    }

    /// Read a key that must hold an ordered collection.
    pub fn get_array(&self, key: &str) -> Result<&[Value], ContextError> {
        match self.get(key)? {
            Value::Array(items) => Ok(items),
            other => Err(ContextError::TypeMismatch {
                key: key.to_string(),
                expected: "a list",
                found: kind_of(other),
            }),
        }
    }

    /// Whether a key has been written. For steps with optional inputs.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Write a key, overwriting any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let replaced = self.entries.insert(key.clone(), value).is_some();
        tracing::debug!(key = key.as_str(), replaced, "context updated");
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the raw entries (used when snapshotting).
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    /// Serialize the whole context to a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Restore a context from a JSON object.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Human-readable name for the shape of a JSON value.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "a record",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
