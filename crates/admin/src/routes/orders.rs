//! Orders tab and order detail (read-only).

use askama::Template;
use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use catalog_desk_core::OrderId;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::{OrderRow, Section, Tab};
use crate::state::AppState;

use super::{PageChrome, render};

/// Build the order detail router (the list lives in the tab router).
pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{id}", get(show))
}

/// Orders list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub chrome: PageChrome,
    pub orders: Vec<OrderRow>,
    pub error: Option<String>,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub chrome: PageChrome,
    pub order: OrderRow,
}

/// Render the orders tab.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn list_page(chrome: PageChrome, section: Section<Vec<OrderRow>>) -> Result<Html<String>, AppError> {
    let (orders, error) = section.into_parts();
    render(&OrdersIndexTemplate {
        chrome,
        orders: orders.unwrap_or_default(),
        error,
    })
}

/// GET /orders/{id}
#[instrument(skip(admin, session, state))]
async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: OrderId = id
        .trim_start_matches('#')
        .parse()
        .map_err(|_| AppError::NotFound(format!("order {id}")))?;

    let order = state
        .views()
        .find_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order #{id}")))?;

    render(&OrderDetailTemplate {
        chrome: PageChrome::load(&admin, &session, Tab::Orders).await,
        order,
    })
}
