//! Engine configuration types for Cogflow.
//!
//! `EngineConfig` represents the optional `cogflow.toml` in the data
//! directory. Every field has a default, so an empty or missing file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where checkpoints are written. `None` means `{data_dir}/checkpoints`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,

    /// Default directory for task outputs (intermediate files, reports).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Default number of items a batch step processes at once.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Model name used when a step does not set `model`.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// LLM backend identifier.
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

fn default_batch_concurrency() -> usize {
    1
}

fn default_model() -> String {
    "default".to_string()
}

fn default_llm_provider() -> String {
    "mock".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: None,
            output_dir: default_output_dir(),
            batch_concurrency: default_batch_concurrency(),
            default_model: default_model(),
            llm_provider: default_llm_provider(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert!(config.checkpoint_dir.is_none());
        assert_eq!(config.output_dir, PathBuf::from("./outputs"));
        assert_eq!(config.batch_concurrency, 1);
        assert_eq!(config.default_model, "default");
        assert_eq!(config.llm_provider, "mock");
    }

    #[test]
    fn test_engine_config_deserialize_with_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_engine_config_deserialize_with_values() {
        let toml_str = r#"
checkpoint_dir = "/var/lib/cogflow/checkpoints"
output_dir = "out"
batch_concurrency = 4
default_model = "gpt-4o"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.checkpoint_dir,
            Some(PathBuf::from("/var/lib/cogflow/checkpoints"))
        );
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.batch_concurrency, 4);
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.llm_provider, "mock");
    }
}
