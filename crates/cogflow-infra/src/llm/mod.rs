//! LLM client implementations.

pub mod mock;

use cogflow_core::llm::BoxLlmClient;
use cogflow_types::llm::LlmError;

pub use mock::MockLlmClient;

/// Build the client named by `llm_provider` in the engine config.
pub fn build_llm_client(provider: &str) -> Result<BoxLlmClient, LlmError> {
    match provider {
        "mock" => Ok(BoxLlmClient::new(MockLlmClient::new())),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}
