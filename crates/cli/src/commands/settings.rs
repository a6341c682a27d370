//! Settings commands.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli settings set-image-key <key>
//! ```
//!
//! Writes to the file named by `ADMIN_SETTINGS_PATH` (default
//! `data/settings.json`). A running server picks the key up on restart.

use std::path::PathBuf;

use catalog_desk_admin::services::{SettingsError, SettingsStore};

const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";

/// Persist the image host API key.
///
/// # Errors
///
/// Returns `SettingsError::EmptyKey` for a blank key, or an I/O error if the
/// settings file cannot be written.
pub async fn set_image_key(key: &str) -> Result<(), SettingsError> {
    dotenvy::dotenv().ok();

    let path = std::env::var("ADMIN_SETTINGS_PATH")
        .map_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH), PathBuf::from);
    let store = SettingsStore::open(&path).await?;
    store.save_image_host_api_key(key).await?;

    tracing::info!(path = %path.display(), "image host API key saved");
    Ok(())
}
