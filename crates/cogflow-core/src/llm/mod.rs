//! LLM client abstractions used by the transformer tasks.
//!
//! - `LlmClient`: RPITIT trait for concrete backends
//! - `BoxLlmClient`: object-safe wrapper for dynamic dispatch

pub mod box_client;
pub mod client;

pub use box_client::BoxLlmClient;
pub use client::LlmClient;
pub use cogflow_types::llm::LlmError;
