//! Admin authentication service.
//!
//! A single administrator logs in with a configured username and password.
//! The password is checked against an argon2 PHC hash from the environment;
//! no credential lives in source code. There is no lockout or backoff.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use crate::config::AdminAuthConfig;
use crate::models::CurrentAdmin;

/// Message shown on the login page after a failed attempt.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    /// Why the attempt failed; `None` on success.
    pub reason: Option<&'static str>,
}

impl LoginOutcome {
    const fn ok() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    const fn denied() -> Self {
        Self {
            success: false,
            reason: Some(INVALID_CREDENTIALS),
        }
    }
}

/// Verifies admin credentials.
#[derive(Clone)]
pub struct AdminAuthService {
    username: String,
    password_hash: SecretString,
}

impl AdminAuthService {
    /// Create the service from the configured credentials.
    #[must_use]
    pub fn new(config: &AdminAuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password_hash: config.password_hash.clone(),
        }
    }

    /// Check a username and password.
    ///
    /// Both must match; the failure reason never says which one was wrong.
    #[must_use]
    pub fn login(&self, username: &str, password: &str) -> LoginOutcome {
        // Verify even for an unknown username so both failures cost the same
        let password_ok = verify_password(password, self.password_hash.expose_secret());
        if username.trim() == self.username && password_ok {
            tracing::info!(username = %self.username, "admin logged in");
            LoginOutcome::ok()
        } else {
            tracing::warn!(username = %username.trim(), "admin login failed");
            LoginOutcome::denied()
        }
    }

    /// Session record for the configured admin.
    #[must_use]
    pub fn current_admin(&self) -> CurrentAdmin {
        CurrentAdmin {
            username: self.username.clone(),
            logged_in_at: Utc::now(),
        }
    }
}

/// Hash a password into an argon2 PHC string for `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a PHC hash. An unparsable hash never verifies.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
