//! Session middleware configuration for admin.
//!
//! Sessions are held in memory: a restart logs the admin out. The cookie has
//! no max-age, so it lasts for the browser session, and the server side
//! expires after a period of inactivity.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::AdminConfig;
use crate::models::{Flash, session_keys};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "catalog_admin_session";

/// Inactivity expiry in seconds (8 hours).
const SESSION_INACTIVITY_SECONDS: i64 = 8 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_INACTIVITY_SECONDS),
        ))
        .with_secure(config.is_https())
        // SameSite=Strict: the panel is never reached from another site
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Queue a banner for the next page render.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

/// Take the pending banner, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
