//! Customer records (read-only from the admin panel).

use serde::{Deserialize, Serialize};

/// A customer row from the customers sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Join date exactly as written in the sheet.
    pub join_date: String,
    pub order_count: u32,
}
