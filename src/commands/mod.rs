//! Command handlers for the thin CLI surface.

pub mod findings;
pub mod scan;
pub mod status;

use anyhow::Result;

use crate::core::config::AgentConfig;
use crate::security::{keystore, platform_sealer};
use crate::storage::Database;
use crate::utils::paths::app_data_dir;

pub const DB_FILE: &str = "credentials.db";

/// Open the local store under the app-data directory, loading (or creating)
/// the master key first. Fatal if the key cannot be unsealed.
pub(crate) fn open_database(config: &AgentConfig) -> Result<Database> {
    let app_data = app_data_dir()?;
    let sealer = platform_sealer(config.allow_insecure_keystore)?;
    let master_key = keystore::load_or_create(&app_data, sealer.as_ref())?;
    Database::open(&app_data.join(DB_FILE), &master_key)
}

pub(crate) fn load_config() -> Result<AgentConfig> {
    let app_data = app_data_dir()?;
    AgentConfig::load(&app_data)
}
