//! Engine configuration loader for Cogflow.
//!
//! Reads `cogflow.toml` from the data directory (`~/.cogflow/` by default)
//! and deserializes it into [`EngineConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use cogflow_types::config::EngineConfig;

/// Name of the engine config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "cogflow.toml";

/// Load engine configuration from `{data_dir}/cogflow.toml`.
///
/// - Missing file: [`EngineConfig::default()`].
/// - Unreadable or unparsable file: a warning, then the default.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE_NAME} found at {}, using defaults", config_path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    }
}

/// Checkpoint directory: the configured one, else `{data_dir}/checkpoints`.
pub fn resolve_checkpoint_dir(config: &EngineConfig, data_dir: &Path) -> PathBuf {
    config
        .checkpoint_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("checkpoints"))
}
