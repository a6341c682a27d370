//! Customers tab (read-only).

use askama::Template;
use axum::response::Html;

use catalog_desk_core::Customer;

use crate::error::AppError;
use crate::filters;
use crate::services::Section;

use super::{PageChrome, render};

/// Customers list template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub chrome: PageChrome,
    pub customers: Vec<Customer>,
    pub error: Option<String>,
}

/// Render the customers tab.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn page(chrome: PageChrome, section: Section<Vec<Customer>>) -> Result<Html<String>, AppError> {
    let (customers, error) = section.into_parts();
    render(&CustomersIndexTemplate {
        chrome,
        customers: customers.unwrap_or_default(),
        error,
    })
}
