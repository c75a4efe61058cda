//! Filesystem adapters for Cogflow.
//!
//! - `checkpoint` -- `FileCheckpointStore`, one JSON file per completed step
//! - `glob` -- `*`/`?` filename patterns for the directory loader
//!
//! Also provides data directory resolution and a parent-creating text writer.

pub mod checkpoint;
pub mod glob;

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "COGFLOW_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `COGFLOW_DATA_DIR` environment variable
/// 2. `~/.cogflow`
/// 3. `./.cogflow`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".cogflow");
    }

    PathBuf::from(".cogflow")
}

/// Write `content` to `path`, creating parent directories first.
pub async fn write_text(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await
}
