//! Dashboard tab.

use askama::Template;
use axum::response::Html;

use crate::error::AppError;
use crate::filters;
use crate::services::{DashboardView, Section};

use super::{PageChrome, render};

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: PageChrome,
    pub stats: Option<DashboardView>,
    pub error: Option<String>,
}

/// Render the dashboard.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn page(chrome: PageChrome, section: Section<DashboardView>) -> Result<Html<String>, AppError> {
    let (stats, error) = section.into_parts();
    render(&DashboardTemplate {
        chrome,
        stats,
        error,
    })
}
