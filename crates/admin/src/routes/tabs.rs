//! Tab routes.
//!
//! Every tab URL goes through [`ViewController`](crate::services::ViewController):
//! the requested tab becomes the only active one and its loader runs once.

use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::services::{Tab, TabSwitch, TabView};
use crate::state::AppState;

use super::{PageChrome, customers, dashboard, orders, products, settings};

/// Build the tab router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_tab))
        .route("/tabs/{name}", get(switch_tab))
        .route("/products", get(products_tab))
        .route("/customers", get(customers_tab))
        .route("/orders", get(orders_tab))
        .route("/settings", get(settings_tab))
}

/// Render the content of a switched tab.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub async fn render_tab(
    admin: &CurrentAdmin,
    session: &Session,
    switch: TabSwitch,
) -> Result<Html<String>, AppError> {
    let mut chrome = PageChrome::load(admin, session, switch.active()).await;
    chrome.links = switch.links;

    match switch.view {
        TabView::Dashboard(section) => dashboard::page(chrome, section),
        TabView::Products(section) => products::list_page(chrome, section),
        TabView::Customers(section) => customers::page(chrome, section),
        TabView::Orders(section) => orders::list_page(chrome, section),
        TabView::Settings(view) => settings::page(chrome, &view),
    }
}

async fn open(
    state: &AppState,
    admin: &CurrentAdmin,
    session: &Session,
    tab: Tab,
) -> Result<Html<String>, AppError> {
    let switch = state.views().open(tab).await;
    render_tab(admin, session, switch).await
}

/// GET /tabs/{name}
#[instrument(skip(admin, session, state))]
async fn switch_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
    let switch = state
        .views()
        .switch_tab(&name)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    render_tab(&admin, &session, switch).await
}

/// GET /
#[instrument(skip_all)]
async fn dashboard_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    open(&state, &admin, &session, Tab::Dashboard).await
}

/// GET /products
#[instrument(skip_all)]
async fn products_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    open(&state, &admin, &session, Tab::Products).await
}

/// GET /customers
#[instrument(skip_all)]
async fn customers_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    open(&state, &admin, &session, Tab::Customers).await
}

/// GET /orders
#[instrument(skip_all)]
async fn orders_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    open(&state, &admin, &session, Tab::Orders).await
}

/// GET /settings
#[instrument(skip_all)]
async fn settings_tab(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    open(&state, &admin, &session, Tab::Settings).await
}
