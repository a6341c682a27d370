//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{
    CatalogData, CatalogError, CatalogReader, CatalogStore, ScriptCatalogClient, SheetsReader,
};
use crate::config::AdminConfig;
use crate::images::{ImageStore, ImageStoreError, ImgbbClient};
use crate::services::{
    AdminAuthService, CatalogFormat, ProductSyncService, SettingsError, SettingsStore,
    ViewController,
};

/// Errors building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("image client: {0}")]
    Images(#[from] ImageStoreError),
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Remote collaborators, injectable for tests.
#[derive(Clone)]
pub struct Remotes {
    pub reader: Arc<dyn CatalogReader>,
    pub catalog: Arc<dyn CatalogStore>,
    pub images: Arc<dyn ImageStore>,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    auth: AdminAuthService,
    data: CatalogData,
    settings: SettingsStore,
    views: ViewController,
    sync: ProductSyncService,
}

impl AppState {
    /// Build state with real HTTP clients and the settings file from config.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a client cannot be built or the settings file
    /// is unreadable.
    pub async fn new(config: AdminConfig) -> Result<Self, StateError> {
        let reader = SheetsReader::new(&config.catalog, config.remote_timeout)?;
        let catalog = ScriptCatalogClient::new(&config.catalog, config.remote_timeout)?;
        let images = ImgbbClient::new(&config.image_host, config.remote_timeout)?;
        let settings = SettingsStore::open(&config.settings_path).await?;

        let remotes = Remotes {
            reader: Arc::new(reader),
            catalog: Arc::new(catalog),
            images: Arc::new(images),
        };
        Ok(Self::with_remotes(config, remotes, settings))
    }

    /// Build state around the given remotes and settings store.
    #[must_use]
    pub fn with_remotes(config: AdminConfig, remotes: Remotes, settings: SettingsStore) -> Self {
        let data = CatalogData::new(remotes.reader, config.catalog.ready_timeout);
        let views = ViewController::new(
            data.clone(),
            settings.clone(),
            CatalogFormat::new(&config.catalog),
        );
        let sync = ProductSyncService::new(
            remotes.catalog,
            remotes.images,
            settings.clone(),
            data.clone(),
            config.catalog.reload_delay,
        );

        Self {
            inner: Arc::new(AppStateInner {
                auth: AdminAuthService::new(&config.auth),
                config,
                data,
                settings,
                views,
                sync,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &AdminAuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn data(&self) -> &CatalogData {
        &self.inner.data
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    #[must_use]
    pub fn views(&self) -> &ViewController {
        &self.inner.views
    }

    #[must_use]
    pub fn sync(&self) -> &ProductSyncService {
        &self.inner.sync
    }
}
