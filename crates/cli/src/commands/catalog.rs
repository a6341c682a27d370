//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli catalog products
//! ```
//!
//! # Environment Variables
//!
//! Reads the same configuration as the admin server (`SHEETS_SPREADSHEET_ID`,
//! `SHEETS_API_KEY`, ...), loaded from `.env` when present.

use thiserror::Error;

use catalog_desk_admin::catalog::{CatalogError, CatalogReader, SheetsReader};
use catalog_desk_admin::config::{AdminConfig, ConfigError};
use catalog_desk_core::Product;

/// Errors that can occur while reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Fetch every product row and print one line per product.
///
/// # Errors
///
/// Returns `CatalogCommandError` if configuration is incomplete or the
/// spreadsheet cannot be read.
pub async fn list_products() -> Result<(), CatalogCommandError> {
    let config = AdminConfig::from_env()?;
    let reader = SheetsReader::new(&config.catalog, config.remote_timeout)?;

    tracing::info!("Fetching products...");
    let products = reader.fetch_products().await?;
    tracing::info!(count = products.len(), "products loaded");

    for product in &products {
        let line = product_line(product, &config.catalog.currency_symbol);
        #[allow(clippy::print_stdout)]
        {
            println!("{line}");
        }
    }
    Ok(())
}

fn product_line(product: &Product, currency_symbol: &str) -> String {
    let fields = &product.fields;
    format!(
        "{:>5}  {:<32}  {:<14}  {:>10}  qty {}",
        product.id.as_i64(),
        fields.name,
        fields.category,
        fields.price.display(currency_symbol),
        fields.quantity,
    )
}
