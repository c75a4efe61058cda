//! Shared domain types for Cogflow.
//!
//! This crate contains the serde types used across the Cogflow workspace:
//! workflow documents and definitions, step/run status tracking, checkpoint
//! records, engine configuration, LLM errors, and the document record exchanged by the
//! built-in loaders and transformers.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod workflow;
