//! Application data directory resolution.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "credsweep";

/// Directory holding the agent's local state (master key, config, database).
///
/// Resolves to the platform's local-app-data directory (`%LOCALAPPDATA%` on
/// Windows, `~/.local/share` on Linux, `~/Library/Application Support` on
/// macOS), creating the `credsweep` subdirectory on first use.
pub fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine local app-data directory")?;
    let path = base.join(APP_DIR_NAME);
    if !path.exists() {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create app-data dir {}", path.display()))?;
    }
    Ok(path)
}

/// The user's local-app-data root, where browser profiles live.
pub fn local_app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
}

/// The user's home directory, where cloud-tooling configs live.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}
