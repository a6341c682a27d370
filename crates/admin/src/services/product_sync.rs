//! Product save and delete workflow.
//!
//! A save runs these steps in order and stops at the first failure:
//!
//! 1. **Collect** - parse the submitted form into a [`ProductDraft`]
//! 2. **Image** - upload a newly submitted file (size and key checked first)
//! 3. **Validate** - a non-empty image URL is required
//! 4. **Persist** - `add` or `update` at the catalog store
//! 5. **Invalidate** - drop the cached product list
//! 6. **Reload** - re-fetch the product list after a short delay
//!
//! Nothing is retried or rolled back. An image uploaded before a failed
//! catalog write stays at the image host.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use catalog_desk_core::{Price, PriceError, ProductDraft, ProductId, parse_features};

use crate::catalog::{
    CatalogAck, CatalogAction, CatalogData, CatalogError, CatalogStore, CatalogWrite, DataError,
};
use crate::images::{ImageStore, ImageStoreError, ImageUpload, MAX_IMAGE_BYTES};
use crate::services::SettingsStore;

/// Errors that abort a save or delete.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Something the admin must set up first (e.g. the image-host key).
    #[error("{0}")]
    Configuration(String),

    /// The submitted form is invalid.
    #[error("{0}")]
    Validation(String),

    /// The submitted image exceeds [`MAX_IMAGE_BYTES`].
    #[error("Image size must be less than 10MB")]
    ImageTooLarge { size: usize },

    /// The image upload failed.
    #[error("Failed to upload image: {0}")]
    Upload(#[source] ImageStoreError),

    /// The catalog store could not be reached or answered with an error status.
    #[error("Catalog request failed: {0}")]
    Catalog(#[source] CatalogError),

    /// The catalog store answered but refused the change.
    #[error("Could not {action} product: {message}")]
    Rejected {
        action: CatalogAction,
        message: String,
    },

    /// The loaded product list was unavailable for validation.
    #[error("Product list unavailable: {0}")]
    Data(#[from] DataError),

    /// The admin declined the confirmation prompt.
    #[error("Cancelled")]
    UserCancelled,
}

impl SyncError {
    /// Whether the form should drop the submitted file when re-rendered.
    #[must_use]
    pub const fn clears_file_input(&self) -> bool {
        matches!(self, Self::ImageTooLarge { .. })
    }

    /// Whether the error was caused by the submitted input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::ImageTooLarge { .. })
    }
}

impl From<CatalogError> for SyncError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Rejected { action, message } => Self::Rejected { action, message },
            other => Self::Catalog(other),
        }
    }
}

/// Raw product form fields as submitted.
///
/// Every field is kept as text so that a re-rendered form shows exactly what
/// the admin typed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    /// Empty in create mode.
    pub editing_product_id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub quantity: String,
    pub description: String,
    /// Pipe-delimited feature list.
    pub features: String,
    /// Current image URL (kept when no new file is uploaded).
    pub image: String,
}

impl ProductForm {
    /// Pre-fill the form from a loaded product.
    #[must_use]
    pub fn for_product(id: ProductId, draft: &ProductDraft) -> Self {
        Self {
            editing_product_id: id.to_string(),
            name: draft.name.clone(),
            category: draft.category.clone(),
            price: draft.price.to_string(),
            quantity: draft.quantity.to_string(),
            description: draft.description.clone(),
            features: catalog_desk_core::join_features(&draft.features),
            image: draft.image.clone(),
        }
    }

    /// The product being edited, or `None` in create mode.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` if the id is not an integer.
    pub fn editing_id(&self) -> Result<Option<ProductId>, SyncError> {
        let raw = self.editing_product_id.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| SyncError::Validation(format!("Invalid product id '{raw}'")))
    }

    /// Parse the fields into a draft.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` for a missing name or bad numbers.
    pub fn collect(&self) -> Result<ProductDraft, SyncError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SyncError::Validation("Product name is required".to_string()));
        }

        let price = Price::parse(&self.price).map_err(|e| {
            SyncError::Validation(match e {
                PriceError::Empty => "Price is required".to_string(),
                other => format!("Invalid price: {other}"),
            })
        })?;

        let quantity_raw = self.quantity.trim();
        let quantity = if quantity_raw.is_empty() {
            0
        } else {
            quantity_raw.parse::<u32>().map_err(|_| {
                SyncError::Validation(format!(
                    "Quantity must be a whole number of zero or more, got '{quantity_raw}'"
                ))
            })?
        };

        Ok(ProductDraft {
            name: name.to_string(),
            category: self.category.trim().to_string(),
            price,
            quantity,
            description: self.description.trim().to_string(),
            features: parse_features(&self.features),
            image: self.image.trim().to_string(),
        })
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub action: CatalogAction,
    /// Id of the saved product when known (always known for updates).
    pub id: Option<ProductId>,
    /// Image URL that was stored.
    pub image: String,
    /// False when the store gave no readable answer.
    pub confirmed: bool,
}

impl SaveOutcome {
    /// Banner text for the admin.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.action {
            CatalogAction::Update => "Product updated successfully!",
            _ => "Product added successfully!",
        }
    }
}

/// Runs product saves and deletes against the remote stores.
#[derive(Clone)]
pub struct ProductSyncService {
    inner: Arc<ProductSyncServiceInner>,
}

struct ProductSyncServiceInner {
    catalog: Arc<dyn CatalogStore>,
    images: Arc<dyn ImageStore>,
    settings: SettingsStore,
    data: CatalogData,
    reload_delay: Duration,
}

impl ProductSyncService {
    /// Create the workflow.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageStore>,
        settings: SettingsStore,
        data: CatalogData,
        reload_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ProductSyncServiceInner {
                catalog,
                images,
                settings,
                data,
                reload_delay,
            }),
        }
    }

    /// Save a product (create or update).
    ///
    /// `image` is the newly submitted file, if any; an empty file counts as
    /// no file.
    ///
    /// # Errors
    ///
    /// Returns the first `SyncError` hit; see the module docs for the order.
    #[instrument(skip(self, form, image), fields(editing = %form.editing_product_id))]
    pub async fn save_product(
        &self,
        form: &ProductForm,
        image: Option<ImageUpload>,
    ) -> Result<SaveOutcome, SyncError> {
        // Collect
        let mut draft = form.collect()?;
        let editing = form.editing_id()?;
        if let Some(id) = editing
            && self.inner.data.find_product(id).await?.is_none()
        {
            return Err(SyncError::Validation(format!(
                "Product {id} is no longer in the catalog"
            )));
        }

        // Image
        let image = image.filter(|i| !i.is_empty());
        let uploaded = image.is_some();
        if let Some(image) = image {
            draft.image = self.upload_image(&image).await?;
        }

        // Validate
        if draft.image.is_empty() {
            return Err(SyncError::Validation(
                "Please upload a product image".to_string(),
            ));
        }

        // Persist
        let request = match editing {
            Some(id) => CatalogWrite::update(id, draft),
            None => CatalogWrite::add(draft),
        };
        let ack = match self.inner.catalog.write(&request).await {
            Ok(ack) => ack,
            Err(e) => {
                if uploaded && let Some(data) = &request.data {
                    tracing::warn!(image = %data.image, error = %e, "catalog write failed after image upload; image left at host");
                }
                return Err(e.into());
            }
        };

        log_ack(&ack);
        let image = request.data.map(|d| d.image).unwrap_or_default();
        self.inner.data.invalidate_products().await;
        self.inner.data.schedule_reload(self.inner.reload_delay);

        Ok(SaveOutcome {
            action: request.action,
            id: ack.id.or(editing),
            image,
            confirmed: ack.confirmed,
        })
    }

    /// Delete a product once the admin has confirmed.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UserCancelled` without contacting the store when
    /// `confirmed` is false, otherwise any catalog error.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId, confirmed: bool) -> Result<(), SyncError> {
        if !confirmed {
            tracing::debug!("delete cancelled");
            return Err(SyncError::UserCancelled);
        }

        let ack = self.inner.catalog.write(&CatalogWrite::delete(id)).await?;
        log_ack(&ack);
        self.inner.data.invalidate_products().await;
        self.inner.data.schedule_reload(self.inner.reload_delay);
        Ok(())
    }

    async fn upload_image(&self, image: &ImageUpload) -> Result<String, SyncError> {
        if image.is_oversized() {
            tracing::info!(size = image.len(), limit = MAX_IMAGE_BYTES, "image rejected as too large");
            return Err(SyncError::ImageTooLarge { size: image.len() });
        }

        let Some(key) = self.inner.settings.image_host_api_key().await else {
            return Err(SyncError::Configuration(
                "Please configure the image host API key in the Settings tab first".to_string(),
            ));
        };

        self.inner
            .images
            .upload(&key, image)
            .await
            .map_err(SyncError::Upload)
    }

}

fn log_ack(ack: &CatalogAck) {
    if ack.confirmed {
        tracing::info!(id = ?ack.id, "catalog write confirmed");
    } else {
        tracing::debug!("catalog write sent without confirmation");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: " Sandal Agarbatti ".to_string(),
            category: "agarbatti".to_string(),
            price: "120".to_string(),
            quantity: "30".to_string(),
            features: "Fast|Durable| |".to_string(),
            image: "https://i.ibb.co/a.jpg".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_collect_parses_fields() {
        let draft = form().collect().unwrap();
        assert_eq!(draft.name, "Sandal Agarbatti");
        assert_eq!(draft.price, Price::parse("120").unwrap());
        assert_eq!(draft.quantity, 30);
        assert_eq!(draft.features, vec!["Fast", "Durable"]);
    }

    #[test]
    fn test_collect_requires_name() {
        let form = ProductForm {
            name: "  ".to_string(),
            ..form()
        };
        assert!(matches!(form.collect(), Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_collect_rejects_bad_numbers() {
        for (price, quantity) in [("abc", "1"), ("-5", "1"), ("", "1"), ("10", "-1"), ("10", "2.5")] {
            let form = ProductForm {
                price: price.to_string(),
                quantity: quantity.to_string(),
                ..form()
            };
            let err = form.collect().unwrap_err();
            assert!(err.is_validation(), "{price}/{quantity}: {err}");
        }
    }

    #[test]
    fn test_blank_quantity_is_zero() {
        let form = ProductForm {
            quantity: String::new(),
            ..form()
        };
        assert_eq!(form.collect().unwrap().quantity, 0);
    }

    #[test]
    fn test_editing_id() {
        assert_eq!(form().editing_id().unwrap(), None);

        let editing = ProductForm {
            editing_product_id: "7".to_string(),
            ..form()
        };
        assert_eq!(editing.editing_id().unwrap(), Some(ProductId::new(7)));

        let bad = ProductForm {
            editing_product_id: "seven".to_string(),
            ..form()
        };
        assert!(bad.editing_id().is_err());
    }

    #[test]
    fn test_for_product_round_trips_features() {
        let draft = form().collect().unwrap();
        let refilled = ProductForm::for_product(ProductId::new(3), &draft);
        assert_eq!(refilled.features, "Fast|Durable");
        assert_eq!(refilled.editing_product_id, "3");
        assert_eq!(refilled.collect().unwrap(), draft);
    }

    #[test]
    fn test_rejection_maps_to_rejected() {
        let err: SyncError = CatalogError::Rejected {
            action: CatalogAction::Add,
            message: "Sheet locked".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Could not add product: Sheet locked");
    }

    #[test]
    fn test_only_oversize_clears_file() {
        assert!(SyncError::ImageTooLarge { size: 1 }.clears_file_input());
        assert!(!SyncError::Validation("x".to_string()).clears_file_input());
    }
}
