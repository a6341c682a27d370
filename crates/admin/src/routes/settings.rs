//! Settings tab: the image host API key.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::post,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, set_flash};
use crate::models::Flash;
use crate::services::{SettingsError, SettingsView};
use crate::state::AppState;

use super::{PageChrome, render};

/// Build the settings router (the GET lives in the tab router).
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", post(save))
}

/// Settings page template.
#[derive(Template)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub chrome: PageChrome,
    pub masked_image_key: Option<&'static str>,
}

/// Submitted settings form.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub image_api_key: String,
}

/// Render the settings tab.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn page(chrome: PageChrome, view: &SettingsView) -> Result<Html<String>, AppError> {
    render(&SettingsTemplate {
        chrome,
        masked_image_key: view.masked_image_key,
    })
}

/// POST /settings
#[instrument(skip_all)]
async fn save(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, AppError> {
    match state
        .settings()
        .save_image_host_api_key(&form.image_api_key)
        .await
    {
        Ok(()) => set_flash(&session, Flash::success("Settings saved successfully!")).await,
        Err(e @ SettingsError::EmptyKey) => set_flash(&session, Flash::error(e.to_string())).await,
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/settings").into_response())
}
