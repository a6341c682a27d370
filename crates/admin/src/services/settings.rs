//! Persisted admin settings.
//!
//! Settings live in a small JSON file so they survive restarts. Today the
//! only setting is the image-host API key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Please enter an image host API key")]
    EmptyKey,
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_host_api_key: Option<String>,
}

/// Settings store backed by a JSON file (or memory only).
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsStoreInner>,
}

struct SettingsStoreInner {
    path: Option<PathBuf>,
    values: RwLock<StoredSettings>,
}

impl SettingsStore {
    /// Open the settings file, starting empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSettings::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), "settings loaded");

        Ok(Self {
            inner: Arc::new(SettingsStoreInner {
                path: Some(path),
                values: RwLock::new(values),
            }),
        })
    }

    /// A store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(SettingsStoreInner {
                path: None,
                values: RwLock::new(StoredSettings::default()),
            }),
        }
    }

    /// The configured image-host API key, if any.
    pub async fn image_host_api_key(&self) -> Option<SecretString> {
        self.inner
            .values
            .read()
            .await
            .image_host_api_key
            .clone()
            .map(SecretString::from)
    }

    /// Store the image-host API key.
    ///
    /// The key is trimmed; an empty key is rejected and nothing is written.
    /// The key is not checked against the image host.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::EmptyKey` for a blank key, or an I/O error if
    /// the file cannot be written.
    pub async fn save_image_host_api_key(&self, key: &str) -> Result<(), SettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SettingsError::EmptyKey);
        }

        let mut values = self.inner.values.write().await;
        let mut next = values.clone();
        next.image_host_api_key = Some(key.to_owned());
        if let Some(path) = &self.inner.path {
            persist(path, &next).await?;
        }
        *values = next;
        tracing::info!("image host API key updated");
        Ok(())
    }
}

/// Write settings via a temp file and rename so a crash never truncates them.
async fn persist(path: &Path, settings: &StoredSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(settings)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
