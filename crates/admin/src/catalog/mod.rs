//! Remote catalog access (spreadsheet-backed).
//!
//! # Architecture
//!
//! The catalog lives in a spreadsheet. Writes go through a script endpoint
//! that accepts `{action, data, id}`; reads go through the spreadsheet values
//! API. Both sides sit behind traits so handlers and the sync workflow never
//! talk to HTTP directly:
//!
//! - [`CatalogStore`] - add/update/delete product rows ([`ScriptCatalogClient`])
//! - [`CatalogReader`] - fetch products, customers and orders ([`SheetsReader`])
//! - [`CatalogData`] - cached collections plus the "products loaded" signal
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_desk_admin::catalog::{CatalogAction, CatalogStore, CatalogWrite};
//!
//! let client = ScriptCatalogClient::new(&config.catalog, config.remote_timeout)?;
//! client.write(&CatalogWrite::delete(ProductId::new(12))).await?;
//! ```

mod data;
mod script;
mod sheets;

pub use data::{CatalogData, DataError, LoadState};
pub use script::ScriptCatalogClient;
pub use sheets::{SheetsReader, parse_customer_row, parse_order_row, parse_product_row};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_desk_core::{Customer, Order, Product, ProductDraft, ProductId};

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status code.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The store answered 2xx but reported an application-level failure.
    #[error("Catalog store rejected the {action} request: {message}")]
    Rejected {
        action: CatalogAction,
        message: String,
    },

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Write action understood by the catalog script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogAction {
    Add,
    Update,
    Delete,
}

impl std::fmt::Display for CatalogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Body of a catalog write: `{action, data, id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogWrite {
    pub action: CatalogAction,
    pub data: Option<ProductDraft>,
    pub id: Option<ProductId>,
}

impl CatalogWrite {
    /// Add a new product; the store assigns the id.
    #[must_use]
    pub const fn add(data: ProductDraft) -> Self {
        Self {
            action: CatalogAction::Add,
            data: Some(data),
            id: None,
        }
    }

    /// Replace the fields of an existing product.
    #[must_use]
    pub const fn update(id: ProductId, data: ProductDraft) -> Self {
        Self {
            action: CatalogAction::Update,
            data: Some(data),
            id: Some(id),
        }
    }

    /// Remove a product.
    #[must_use]
    pub const fn delete(id: ProductId) -> Self {
        Self {
            action: CatalogAction::Delete,
            data: None,
            id: Some(id),
        }
    }
}

/// Acknowledgement returned by a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogAck {
    /// Id reported by the store (new row id on add), when it sends one.
    pub id: Option<ProductId>,
    /// False when the store gave no readable answer and success was assumed.
    pub confirmed: bool,
}

/// Write side of the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Send one write to the store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on transport failure, a non-2xx status, or an
    /// explicit rejection in the response body.
    async fn write(&self, request: &CatalogWrite) -> Result<CatalogAck, CatalogError>;
}

/// Read side of the catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Fetch every product row.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// Fetch every customer row.
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CatalogError>;

    /// Fetch every order row.
    async fn fetch_orders(&self) -> Result<Vec<Order>, CatalogError>;
}
