//! Orchestration core and port definitions for Cogflow.
//!
//! This crate defines the workflow engine (context, tasks, registry, batch
//! map/reduce, checkpointing, runner) and the "ports" the infrastructure
//! layer implements (`CheckpointStore`, `LlmClient`). It depends only on
//! `cogflow-types` -- never on `cogflow-infra`.

pub mod llm;
pub mod repository;
pub mod workflow;
