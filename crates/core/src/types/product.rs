//! Catalog product records.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Separator used when features are stored or edited as a single string.
pub const FEATURE_SEPARATOR: char = '|';

/// A product as stored in the catalog sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Row id assigned by the catalog store.
    pub id: ProductId,
    #[serde(flatten)]
    pub fields: ProductDraft,
}

/// Product fields without an id.
///
/// This is the `data` object sent to the catalog store on add and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductDraft {
    pub name: String,
    /// Key into the category lookup (e.g. `incense`).
    pub category: String,
    pub price: Price,
    /// Units in stock.
    pub quantity: u32,
    pub description: String,
    pub features: Vec<String>,
    /// Public image URL.
    pub image: String,
}

impl Product {
    /// Features joined back into the editable `a|b|c` form.
    #[must_use]
    pub fn features_text(&self) -> String {
        join_features(&self.fields.features)
    }
}

/// Split a pipe-delimited feature string into trimmed, non-empty entries.
///
/// ```
/// use catalog_desk_core::parse_features;
///
/// assert_eq!(parse_features("Fast|Durable| |"), vec!["Fast", "Durable"]);
/// assert!(parse_features("").is_empty());
/// ```
#[must_use]
pub fn parse_features(raw: &str) -> Vec<String> {
    raw.split(FEATURE_SEPARATOR)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Join features into the pipe-delimited form accepted by [`parse_features`].
#[must_use]
pub fn join_features(features: &[String]) -> String {
    features.join("|")
}
