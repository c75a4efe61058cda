//! LLM types shared between the client port and its implementations.

use serde::{Deserialize, Serialize};

/// Errors from an LLM client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("unknown LLM provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One prompt sent to a model, as recorded in step outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmCall {
    pub model: String,
    pub prompt_chars: usize,
    pub response_chars: usize,
}
