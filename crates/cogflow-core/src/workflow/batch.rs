//! Batch support for tasks: map a per-item transform over a context-held
//! collection, and reduce a collection to a single artifact.
//!
//! # Map
//!
//! `map_collection` reads the list at `input_key`, runs an [`ItemTransform`]
//! on every element and writes the results to `output_key`. Element `i` of
//! the output is always the transform of element `i` of the input. With
//! `concurrency > 1` items run concurrently in a `JoinSet` bounded by a
//! `Semaphore`; outcomes are accepted in index order as the completed prefix
//! grows, so completion order never leaks into the output, the persisted
//! files, or which failure an abort reports.
//!
//! Item failures follow [`ErrorPolicy`] (default `Abort`). Results can be
//! persisted one file per item; a persistence failure is reported in the
//! [`BatchReport`] and only aborts the batch when `fail_on_persist_error` is set.
//!
//! # Reduce
//!
//! `reduce_collection` combines the list at `input_key` with a
//! [`ReducePolicy`]. Reducing an empty list yields the policy's empty value.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cogflow_types::workflow::{ConfigFieldError, StepConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::context::{kind_of, WorkflowContext};
use super::task::{Task, TaskError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Separator used by `Concatenate` when none is configured.
pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// Appended to the item stem when naming persisted results.
pub const DEFAULT_FILENAME_SUFFIX: &str = "_processed";

/// Extension of persisted item results.
pub const DEFAULT_FILE_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What a map does when one item's transform fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failed item and fail the batch.
    #[default]
    Abort,
    /// Process every item, then fail listing all failed items.
    Collect,
    /// Substitute the transform's fallback value for failed items and succeed.
    Continue,
}

/// Where and how item results are written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOptions {
    pub output_dir: PathBuf,
    pub suffix: String,
    pub extension: String,
}

impl PersistOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            suffix: DEFAULT_FILENAME_SUFFIX.to_string(),
            extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }

    /// `<output_dir>/<identity><suffix>.<extension>`
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.output_dir
            .join(format!("{identity}{}.{}", self.suffix, self.extension))
    }
}

/// Options controlling a map over a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of items in flight. `1` processes strictly in order.
    pub concurrency: usize,
    pub on_error: ErrorPolicy,
    /// `Some` when each item's result should also be written to disk.
    pub persist: Option<PersistOptions>,
    /// Treat a failed item write as a batch failure instead of a warning.
    pub fail_on_persist_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            on_error: ErrorPolicy::Abort,
            persist: None,
            fail_on_persist_error: false,
        }
    }
}

/// The batch-related fields of a step config.
#[derive(Debug, Deserialize)]
struct BatchSettings {
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(default)]
    on_error: Option<ErrorPolicy>,
    #[serde(default)]
    save_intermediate_files: bool,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    filename_suffix: Option<String>,
    #[serde(default)]
    file_extension: Option<String>,
    #[serde(default)]
    fail_on_persist_error: bool,
}

impl BatchOptions {
    /// Read batch options from a step config.
    ///
    /// Recognised fields: `concurrency`, `on_error` (`abort` | `collect` |
    /// `continue`), `save_intermediate_files`, `output_dir`,
    /// `filename_suffix`, `file_extension`, `fail_on_persist_error`.
    pub fn from_config(
        config: &StepConfig,
        default_concurrency: usize,
        default_output_dir: &Path,
    ) -> Result<Self, ConfigFieldError> {
        let settings: BatchSettings = config.parse()?;

        let concurrency = settings.concurrency.unwrap_or(default_concurrency);
        if concurrency == 0 {
            return Err(ConfigFieldError::WrongType {
                field: "concurrency".to_string(),
                expected: "positive integer",
            });
        }

        let persist = settings.save_intermediate_files.then(|| PersistOptions {
            output_dir: settings
                .output_dir
                .unwrap_or_else(|| default_output_dir.to_path_buf()),
            suffix: settings
                .filename_suffix
                .unwrap_or_else(|| DEFAULT_FILENAME_SUFFIX.to_string()),
            extension: settings
                .file_extension
                .unwrap_or_else(|| DEFAULT_FILE_EXTENSION.to_string()),
        });

        Ok(Self {
            concurrency,
            on_error: settings.on_error.unwrap_or_default(),
            persist,
            fail_on_persist_error: settings.fail_on_persist_error,
        })
    }
}

// ---------------------------------------------------------------------------
// Report and errors
// ---------------------------------------------------------------------------

/// One item that failed to transform or persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub index: usize,
    pub identity: String,
    pub error: String,
}

/// Summary of a completed map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    /// Failed items (only non-empty under `Continue`).
    pub failures: Vec<ItemFailure>,
    pub persisted: Vec<PathBuf>,
    pub persist_errors: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Errors from map and reduce operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The input key does not hold a list.
    #[error("context key '{key}' must hold a list, found {found}")]
    NotACollection { key: String, found: &'static str },

    /// An item failed under `ErrorPolicy::Abort`.
    #[error("item {index} ('{identity}') failed: {source}")]
    ItemFailed {
        index: usize,
        identity: String,
        #[source]
        source: Box<TaskError>,
    },

    /// One or more items failed under `ErrorPolicy::Collect`.
    #[error("{} of {total} items failed: {}", .failures.len(), summarize(.failures))]
    ItemsFailed {
        total: usize,
        failures: Vec<ItemFailure>,
    },

    /// Writing an item result failed and `fail_on_persist_error` is set.
    #[error("failed to persist item {index} to {}: {error}", .path.display())]
    PersistFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },

    /// `MergeObjects` met an element that is not a record.
    #[error("cannot merge item {index}: expected a record, found {found}")]
    NotARecord { index: usize, found: &'static str },

    /// A spawned item task panicked or was cancelled.
    #[error("batch worker failed: {0}")]
    Join(String),
}

fn summarize(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}: {}", f.index, f.identity, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// ItemTransform
// ---------------------------------------------------------------------------

/// A per-item transform applied by `map_collection`.
///
/// Items are independent: a transform must not read other items' results.
pub trait ItemTransform: Send + Sync + 'static {
    fn transform(
        &self,
        index: usize,
        item: &Value,
    ) -> impl Future<Output = Result<Value, TaskError>> + Send;

    /// Value used in place of a failed item under `ErrorPolicy::Continue`.
    fn fallback(&self, _index: usize, _item: &Value, _error: &TaskError) -> Value {
        Value::Null
    }
}

/// Stable identity of an item: the stem of its `filename` field, or `item_<index>`.
pub fn item_identity(index: usize, item: &Value) -> String {
    match item.get("filename").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => match name.rfind('.') {
            Some(pos) if pos > 0 => name[..pos].to_string(),
            _ => name.to_string(),
        },
        _ => format!("item_{index:04}"),
    }
}

/// Identities for a whole batch, unique within it.
///
/// When any two items share an identity, every identity is prefixed with
/// `<index:04>-`; the digits before the first `-` then differ per item.
pub fn batch_identities(items: &[Value]) -> Vec<String> {
    let identities: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(index, item)| item_identity(index, item))
        .collect();

    let unique = {
        let mut seen = HashSet::with_capacity(identities.len());
        identities.iter().all(|id| seen.insert(id.as_str()))
    };
    if unique {
        return identities;
    }

    tracing::debug!(items = identities.len(), "duplicate item identities, prefixing with index");
    identities
        .into_iter()
        .enumerate()
        .map(|(index, id)| format!("{index:04}-{id}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Map `transform` over the list at `input_key` and write the results to `output_key`.
///
/// Nothing is written to `output_key` when the batch fails.
pub async fn map_collection<T: ItemTransform>(
    ctx: &mut WorkflowContext,
    input_key: &str,
    output_key: &str,
    transform: T,
    options: &BatchOptions,
) -> Result<BatchReport, TaskError> {
    let items = match ctx.get(input_key)? {
        Value::Array(items) => items.clone(),
        other => {
            return Err(BatchError::NotACollection {
                key: input_key.to_string(),
                found: kind_of(other),
            }
            .into());
        }
    };

    tracing::info!(
        input_key,
        output_key,
        items = items.len(),
        concurrency = options.concurrency,
        "starting batch"
    );

    let (results, report) = map_values(items, transform, options).await?;
    ctx.set(output_key, Value::Array(results));

    tracing::info!(
        output_key,
        succeeded = report.succeeded,
        failed = report.failures.len(),
        persisted = report.persisted.len(),
        "batch complete"
    );
    Ok(report)
}

/// Map `transform` over `items`, returning results in input order.
pub async fn map_values<T: ItemTransform>(
    items: Vec<Value>,
    transform: T,
    options: &BatchOptions,
) -> Result<(Vec<Value>, BatchReport), BatchError> {
    let total = items.len();
    let transform = Arc::new(transform);
    let mut collector = Collector::new(batch_identities(&items), options);

    if options.concurrency <= 1 {
        for (index, item) in items.into_iter().enumerate() {
            let result = transform.transform(index, &item).await;
            collector.accept(&*transform, index, &item, result).await?;
        }
    } else {
        let semaphore = Arc::new(Semaphore::new(options.concurrency));
        let mut join_set = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let transform = Arc::clone(&transform);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => transform.transform(index, &item).await,
                    Err(e) => Err(TaskError::Failed(format!("batch semaphore closed: {e}"))),
                };
                (index, item, result)
            });
        }

        // Returning early drops the JoinSet, which aborts items still in flight.
        let mut ready: Vec<Option<(Value, Result<Value, TaskError>)>> =
            (0..total).map(|_| None).collect();
        let mut next = 0;
        while let Some(joined) = join_set.join_next().await {
            let (index, item, result) = joined.map_err(|e| BatchError::Join(e.to_string()))?;
            ready[index] = Some((item, result));
            while let Some((item, result)) = ready.get_mut(next).and_then(Option::take) {
                collector.accept(&*transform, next, &item, result).await?;
                next += 1;
            }
        }
    }

    collector.finish()
}

/// Accumulates item outcomes into index-addressed slots.
struct Collector<'a> {
    options: &'a BatchOptions,
    identities: Vec<String>,
    slots: Vec<Option<Value>>,
    report: BatchReport,
}

impl<'a> Collector<'a> {
    fn new(identities: Vec<String>, options: &'a BatchOptions) -> Self {
        let total = identities.len();
        Self {
            options,
            identities,
            slots: vec![None; total],
            report: BatchReport {
                total,
                ..BatchReport::default()
            },
        }
    }

    async fn accept<T: ItemTransform>(
        &mut self,
        transform: &T,
        index: usize,
        item: &Value,
        result: Result<Value, TaskError>,
    ) -> Result<(), BatchError> {
        let identity = self.identities[index].clone();
        match result {
            Ok(value) => {
                if let Some(persist) = &self.options.persist {
                    self.persist(persist, index, &identity, &value).await?;
                }
                self.slots[index] = Some(value);
                self.report.succeeded += 1;
                tracing::debug!(index, identity = identity.as_str(), "item complete");
                Ok(())
            }
            Err(error) => match self.options.on_error {
                ErrorPolicy::Abort => {
                    tracing::error!(index, identity = identity.as_str(), %error, "item failed, aborting batch");
                    Err(BatchError::ItemFailed {
                        index,
                        identity,
                        source: Box::new(error),
                    })
                }
                ErrorPolicy::Collect => {
                    tracing::warn!(index, identity = identity.as_str(), %error, "item failed");
                    self.report.failures.push(ItemFailure {
                        index,
                        identity,
                        error: error.to_string(),
                    });
                    Ok(())
                }
                ErrorPolicy::Continue => {
                    tracing::warn!(index, identity = identity.as_str(), %error, "item failed, using fallback");
                    self.slots[index] = Some(transform.fallback(index, item, &error));
                    self.report.failures.push(ItemFailure {
                        index,
                        identity,
                        error: error.to_string(),
                    });
                    Ok(())
                }
            },
        }
    }

    async fn persist(
        &mut self,
        persist: &PersistOptions,
        index: usize,
        identity: &str,
        value: &Value,
    ) -> Result<(), BatchError> {
        let path = persist.path_for(identity);
        match write_item(&persist.output_dir, &path, value).await {
            Ok(()) => {
                tracing::info!(index, path = %path.display(), "saved intermediate file");
                self.report.persisted.push(path);
                Ok(())
            }
            Err(e) if self.options.fail_on_persist_error => Err(BatchError::PersistFailed {
                index,
                path,
                error: e.to_string(),
            }),
            Err(e) => {
                tracing::warn!(index, path = %path.display(), error = %e, "failed to save intermediate file");
                self.report.persist_errors.push(ItemFailure {
                    index,
                    identity: identity.to_string(),
                    error: e.to_string(),
                });
                Ok(())
            }
        }
    }

    fn finish(mut self) -> Result<(Vec<Value>, BatchReport), BatchError> {
        if self.options.on_error == ErrorPolicy::Collect && !self.report.failures.is_empty() {
            self.report.failures.sort_by_key(|f| f.index);
            return Err(BatchError::ItemsFailed {
                total: self.report.total,
                failures: self.report.failures,
            });
        }
        self.report.failures.sort_by_key(|f| f.index);
        let results = self
            .slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect();
        Ok((results, self.report))
    }
}

async fn write_item(dir: &Path, path: &Path, value: &Value) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let content = match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).map_err(std::io::Error::other)?,
    };
    tokio::fs::write(path, content).await
}

// ---------------------------------------------------------------------------
// Reduce
// ---------------------------------------------------------------------------

/// How an ordered collection is combined into one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReducePolicy {
    /// Join items as text, in order. Non-text items are rendered as compact JSON.
    Concatenate { separator: String },
    /// Keep the items as one list artifact.
    JsonArray,
    /// Shallow-merge records left to right; later keys win.
    MergeObjects,
}

impl Default for ReducePolicy {
    fn default() -> Self {
        ReducePolicy::Concatenate {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ReducePolicy {
    /// Read `policy` (default `concatenate`) and `separator` from a step config.
    pub fn from_config(config: &StepConfig) -> Result<Self, ConfigFieldError> {
        match config.str_or("policy", "concatenate")? {
            "concatenate" => Ok(ReducePolicy::Concatenate {
                separator: config.str_or("separator", DEFAULT_SEPARATOR)?.to_string(),
            }),
            "json_array" => Ok(ReducePolicy::JsonArray),
            "merge_objects" => Ok(ReducePolicy::MergeObjects),
            other => Err(ConfigFieldError::Invalid(format!(
                "unknown reduce policy '{other}' (expected concatenate, json_array or merge_objects)"
            ))),
        }
    }

    /// The result of reducing an empty collection.
    pub fn empty_value(&self) -> Value {
        match self {
            ReducePolicy::Concatenate { .. } => Value::String(String::new()),
            ReducePolicy::JsonArray => Value::Array(Vec::new()),
            ReducePolicy::MergeObjects => Value::Object(Map::new()),
        }
    }
}

/// Combine `items` according to `policy`.
pub fn reduce_values(items: &[Value], policy: &ReducePolicy) -> Result<Value, BatchError> {
    if items.is_empty() {
        return Ok(policy.empty_value());
    }
    match policy {
        ReducePolicy::Concatenate { separator } => {
            let parts: Vec<String> = items.iter().map(value_to_text).collect();
            Ok(Value::String(parts.join(separator)))
        }
        ReducePolicy::JsonArray => Ok(Value::Array(items.to_vec())),
        ReducePolicy::MergeObjects => {
            let mut merged = Map::new();
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => {
                        merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    other => {
                        return Err(BatchError::NotARecord {
                            index,
                            found: kind_of(other),
                        });
                    }
                }
            }
            Ok(Value::Object(merged))
        }
    }
}

/// Reduce the list at `input_key` into `output_key`. Returns the item count.
pub fn reduce_collection(
    ctx: &mut WorkflowContext,
    input_key: &str,
    output_key: &str,
    policy: &ReducePolicy,
) -> Result<usize, TaskError> {
    let combined = match ctx.get(input_key)? {
        Value::Array(items) => {
            tracing::info!(input_key, output_key, items = items.len(), "reducing collection");
            (items.len(), reduce_values(items, policy)?)
        }
        other => {
            return Err(BatchError::NotACollection {
                key: input_key.to_string(),
                found: kind_of(other),
            }
            .into());
        }
    };
    ctx.set(output_key, combined.1);
    Ok(combined.0)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ReduceTask
// ---------------------------------------------------------------------------

/// Generic reduce step: `input_key`, `output_key`, `policy`, `separator`.
#[derive(Debug, Default)]
pub struct ReduceTask;

impl Task for ReduceTask {
    async fn execute(
        &self,
        ctx: &mut WorkflowContext,
        config: &StepConfig,
    ) -> Result<Option<Value>, TaskError> {
        let input_key = config.require_str("input_key")?;
        let output_key = config.require_str("output_key")?;
        let policy = ReducePolicy::from_config(config)?;
        let count = reduce_collection(ctx, input_key, output_key, &policy)?;
        Ok(Some(serde_json::json!({ "items": count })))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
