//! Agent configuration, persisted as `<app_data>/config.json`.
//!
//! Missing file or unknown keys fall back to defaults; a broken file is
//! reported rather than silently replaced.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directories scanned by the filesystem and git collectors.
    #[serde(default = "default_scan_paths")]
    pub scan_paths: Vec<PathBuf>,

    #[serde(default = "default_true")]
    pub include_browser_scans: bool,

    #[serde(default = "default_true")]
    pub include_git_scans: bool,

    #[serde(default = "default_true")]
    pub include_env_scans: bool,

    /// Central collector base URL; empty disables sync.
    #[serde(default)]
    pub cloud_url: String,

    /// Opt-in to storing the master key unsealed on platforms without an OS
    /// data-protection primitive. Test environments only.
    #[serde(default)]
    pub allow_insecure_keystore: bool,

    /// Commit depth for the git history scan.
    #[serde(default = "default_max_history_commits")]
    pub max_history_commits: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            scan_paths: default_scan_paths(),
            include_browser_scans: true,
            include_git_scans: true,
            include_env_scans: true,
            cloud_url: String::new(),
            allow_insecure_keystore: false,
            max_history_commits: default_max_history_commits(),
        }
    }
}

fn default_scan_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join("Desktop"),
        home.join("Documents"),
        home.join("Downloads"),
    ]
}

fn default_true() -> bool {
    true
}

fn default_max_history_commits() -> u32 {
    crate::collectors::git::DEFAULT_MAX_COMMITS
}

impl AgentConfig {
    /// Load from `<app_data>/config.json`, defaulting when absent.
    pub fn load(app_data: &Path) -> Result<Self> {
        let path = app_data.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn save(&self, app_data: &Path) -> Result<()> {
        let path = app_data.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn sync_enabled(&self) -> bool {
        !self.cloud_url.is_empty()
    }
}
