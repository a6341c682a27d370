//! Catalog read client for the spreadsheet values API.
//!
//! # Sheet Layouts
//!
//! ```text
//! Products!A2:H   id | name | category | price | description | features | image | quantity
//! Customers!A2:E  name | email | phone | join_date | order_count
//! Orders!A2:F     id | customer_name | date | item_count | total | status
//! ```
//!
//! Cells arrive as formatted strings. Missing trailing cells default to empty
//! strings or zero. Rows whose id does not parse are skipped with a warning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use catalog_desk_core::{
    Customer, Order, OrderId, OrderStatus, Price, Product, ProductDraft, ProductId, parse_features,
};

use super::{CatalogError, CatalogReader};
use crate::config::CatalogConfig;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const PRODUCTS_RANGE: &str = "Products!A2:H";
const CUSTOMERS_RANGE: &str = "Customers!A2:E";
const ORDERS_RANGE: &str = "Orders!A2:F";

/// Spreadsheet values response.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Reads catalog collections from the spreadsheet.
#[derive(Clone)]
pub struct SheetsReader {
    inner: Arc<SheetsReaderInner>,
}

struct SheetsReaderInner {
    client: reqwest::Client,
    spreadsheet_id: String,
    api_key: SecretString,
}

impl SheetsReader {
    /// Create a new spreadsheet reader.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(SheetsReaderInner {
                client,
                spreadsheet_id: config.spreadsheet_id.clone(),
                api_key: config.sheets_api_key.clone(),
            }),
        })
    }

    /// Fetch the raw rows of a range.
    #[instrument(skip(self))]
    async fn fetch_range(&self, range: &str) -> Result<Vec<Vec<String>>, CatalogError> {
        let mut url = url::Url::parse(SHEETS_BASE_URL)
            .map_err(|e| CatalogError::Parse(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| CatalogError::Parse("base URL cannot be a base".to_string()))?
            .push(&self.inner.spreadsheet_id)
            .push("values")
            .push(range);
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        tracing::debug!(rows = body.values.len(), "fetched sheet range");
        Ok(body.values)
    }
}

#[async_trait]
impl CatalogReader for SheetsReader {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let rows = self.fetch_range(PRODUCTS_RANGE).await?;
        Ok(collect_rows(&rows, "Products", parse_product_row))
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, CatalogError> {
        let rows = self.fetch_range(CUSTOMERS_RANGE).await?;
        Ok(collect_rows(&rows, "Customers", parse_customer_row))
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, CatalogError> {
        let rows = self.fetch_range(ORDERS_RANGE).await?;
        Ok(collect_rows(&rows, "Orders", parse_order_row))
    }
}

/// Parse every non-blank row, logging and skipping the ones that fail.
fn collect_rows<T>(
    rows: &[Vec<String>],
    sheet: &str,
    parse: fn(&[String]) -> Result<T, CatalogError>,
) -> Vec<T> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .filter_map(|(index, row)| match parse(row) {
            Ok(item) => Some(item),
            Err(e) => {
                // Data starts on sheet row 2
                tracing::warn!(sheet, row = index + 2, error = %e, "skipping unparsable row");
                None
            }
        })
        .collect()
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", |c| c.trim())
}

/// Strip currency symbols and thousands separators from a formatted number.
fn numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect()
}

fn parse_count(raw: &str) -> u32 {
    numeric(raw).parse().unwrap_or(0)
}

fn parse_price(raw: &str) -> Price {
    Price::parse(&numeric(raw)).unwrap_or(Price::ZERO)
}

/// Parse one `Products` row.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the id cell is not an integer.
pub fn parse_product_row(row: &[String]) -> Result<Product, CatalogError> {
    let id: ProductId = cell(row, 0)
        .parse()
        .map_err(|_| CatalogError::Parse(format!("invalid product id '{}'", cell(row, 0))))?;

    Ok(Product {
        id,
        fields: ProductDraft {
            name: cell(row, 1).to_string(),
            category: cell(row, 2).to_string(),
            price: parse_price(cell(row, 3)),
            description: cell(row, 4).to_string(),
            features: parse_features(cell(row, 5)),
            image: cell(row, 6).to_string(),
            quantity: parse_count(cell(row, 7)),
        },
    })
}

/// Parse one `Customers` row.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the row has no name and no email.
pub fn parse_customer_row(row: &[String]) -> Result<Customer, CatalogError> {
    let name = cell(row, 0);
    let email = cell(row, 1);
    if name.is_empty() && email.is_empty() {
        return Err(CatalogError::Parse("customer row has no name or email".to_string()));
    }

    Ok(Customer {
        name: name.to_string(),
        email: email.to_string(),
        phone: cell(row, 2).to_string(),
        join_date: cell(row, 3).to_string(),
        order_count: parse_count(cell(row, 4)),
    })
}

/// Parse one `Orders` row.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the id cell is not an integer.
pub fn parse_order_row(row: &[String]) -> Result<Order, CatalogError> {
    let raw_id = cell(row, 0).trim_start_matches('#');
    let id: OrderId = raw_id
        .parse()
        .map_err(|_| CatalogError::Parse(format!("invalid order id '{raw_id}'")))?;
    let Ok(status) = cell(row, 5).parse::<OrderStatus>();

    Ok(Order {
        id,
        customer_name: cell(row, 1).to_string(),
        date: cell(row, 2).to_string(),
        item_count: parse_count(cell(row, 3)),
        total: parse_price(cell(row, 4)),
        status,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_parse_full_product_row() {
        let product = parse_product_row(&row(&[
            "4",
            "Brass Diya",
            "diya",
            "₹1,250.00",
            "Handmade",
            "Brass| Polished |",
            "https://i.ibb.co/x/diya.jpg",
            "12",
        ]))
        .unwrap();
        assert_eq!(product.id, ProductId::new(4));
        assert_eq!(product.fields.price, Price::parse("1250").unwrap());
        assert_eq!(product.fields.features, vec!["Brass", "Polished"]);
        assert_eq!(product.fields.quantity, 12);
    }

    #[test]
    fn test_short_product_row_defaults() {
        let product = parse_product_row(&row(&["5", "Dhoop"])).unwrap();
        assert_eq!(product.fields.quantity, 0);
        assert!(product.fields.image.is_empty());
        assert!(product.fields.features.is_empty());
    }

    #[test]
    fn test_product_row_without_id_fails() {
        assert!(parse_product_row(&row(&["", "Nameless"])).is_err());
    }

    #[test]
    fn test_parse_order_row() {
        let order = parse_order_row(&row(&["#1001", "Asha", "2024-03-01", "3", "450", "Shipped"])).unwrap();
        assert_eq!(order.id, OrderId::new(1001));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.item_count, 3);
    }

    #[test]
    fn test_parse_customer_row() {
        let customer = parse_customer_row(&row(&["Ravi", "ravi@mail.in", "98765", "2024-01-02", "4"])).unwrap();
        assert_eq!(customer.order_count, 4);
        assert!(parse_customer_row(&row(&["", ""])).is_err());
    }

    #[test]
    fn test_collect_rows_skips_blank_and_bad_rows() {
        let rows = vec![
            row(&["1", "A"]),
            row(&["", ""]),
            row(&["x", "Bad id"]),
            row(&["2", "B"]),
        ];
        let products = collect_rows(&rows, "Products", parse_product_row);
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].id, ProductId::new(2));
    }
}
