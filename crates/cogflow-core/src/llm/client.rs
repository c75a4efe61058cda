//! LlmClient trait definition.
//!
//! The single capability the transformer tasks need from a language model:
//! send a prompt to a named model and get text back. Implementations live in
//! cogflow-infra (e.g. `MockLlmClient`).

use std::future::Future;

use cogflow_types::llm::LlmError;

/// Trait for LLM backends.
///
/// Uses native async fn in traits (RPITIT). Wrap in `BoxLlmClient` for
/// runtime selection.
pub trait LlmClient: Send + Sync {
    /// Human-readable provider name (e.g. "mock").
    fn name(&self) -> &str;

    /// Send `prompt` to `model` and return the completion text.
    fn query(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}
