//! Task registry: maps a step's `type` string to a task factory.
//!
//! Registration is explicit and scoped to a registry instance, never a
//! process-wide global, so independent runs can use different task sets.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::task::{BoxTask, Task};

/// Produces a fresh task instance for one step call.
pub type TaskFactory = Arc<dyn Fn() -> BoxTask + Send + Sync>;

/// Errors from registering or resolving task types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("task type '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),
}

/// Registry of available task types, indexed by name.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a factory. Fails if the name is already bound.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> BoxTask + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateRegistration(name));
        }
        tracing::debug!(task_type = name.as_str(), "registered task type");
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Register a stateless task type that can be built with `Default`.
    pub fn register_task<T>(&mut self, name: impl Into<String>) -> Result<(), RegistryError>
    where
        T: Task + Default + 'static,
    {
        self.register(name, || BoxTask::new(T::default()))
    }

    /// Instantiate the task bound to `name`.
    pub fn resolve(&self, name: &str) -> Result<BoxTask, RegistryError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownTaskType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn list_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// A registered name equal to `name` ignoring ASCII case, if any.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.factories
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("task_types", &self.list_names())
            .finish()
    }
}
