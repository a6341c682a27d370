//! Authentication route handlers for admin.
//!
//! Provides the login form, credential check and logout.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::state::AppState;

use super::render;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub username: String,
    pub error: Option<String>,
}

/// Submitted login form.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Result<Response, AppError> {
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let page = render(&LoginPageTemplate {
        username: String::new(),
        error: None,
    })?;
    Ok(page.into_response())
}

/// Check credentials and start the admin session.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let auth = state.auth();
    let outcome = auth.login(&form.username, &form.password);

    if !outcome.success {
        let page = render(&LoginPageTemplate {
            username: form.username,
            error: outcome.reason.map(ToString::to_string),
        })?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    }

    let admin = auth.current_admin();
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.username);
    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "failed to clear admin session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
