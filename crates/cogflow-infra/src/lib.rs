//! Infrastructure layer for Cogflow.
//!
//! Contains implementations of the traits defined in `cogflow-core`:
//! filesystem checkpoint storage, engine config loading, LLM clients, and the
//! built-in task library registered under the workflow type names.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod tasks;
