//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Verify credentials
//! POST /auth/logout                - Logout
//!
//! # Tabs
//! GET  /                           - Dashboard tab
//! GET  /tabs/{name}                - Switch tab by name
//! GET  /customers                  - Customers tab
//! GET  /orders                     - Orders tab
//! GET  /orders/{id}                - Order detail
//!
//! # Products
//! GET  /products                   - Products tab
//! GET  /products/new               - Create form
//! GET  /products/{id}/edit         - Edit form
//! POST /products                   - Save (multipart, create or update)
//! GET  /products/{id}/delete       - Delete confirmation
//! POST /products/{id}/delete       - Delete (confirm=yes)
//!
//! # Settings
//! GET  /settings                   - Settings tab
//! POST /settings                   - Save image host API key
//! ```
//!
//! Health routes live in the top-level app router.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;
pub mod tabs;

use askama::Template;
use axum::Router;
use axum::response::Html;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::take_flash;
use crate::models::{CurrentAdmin, Flash};
use crate::services::{Tab, TabLink, views::tab_links};
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(tabs::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(settings::router())
}

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub username: String,
    pub logged_in_at: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            username: admin.username.clone(),
            logged_in_at: admin.logged_in_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// Shared layout data: admin, navigation and the pending banner.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub admin_user: AdminUserView,
    pub links: Vec<TabLink>,
    pub flash: Option<Flash>,
}

impl PageChrome {
    /// Layout for `active`, consuming any pending banner.
    pub async fn load(admin: &CurrentAdmin, session: &Session, active: Tab) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            links: tab_links(active),
            flash: take_flash(session).await,
        }
    }

    /// Replace the banner with one produced by this request.
    #[must_use]
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

/// Render a template, turning failures into an `AppError`.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
