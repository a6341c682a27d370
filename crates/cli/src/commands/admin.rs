//! Administrator credential commands.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli admin hash-password 'correct horse battery staple'
//! ```
//!
//! The printed PHC string goes into `ADMIN_PASSWORD_HASH`.

use thiserror::Error;

use catalog_desk_admin::services;

/// Shortest password accepted for the admin account.
const MIN_PASSWORD_LEN: usize = 12;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Password too short to be worth hashing.
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    /// Hashing failed.
    #[error("Failed to hash password: {0}")]
    Hash(String),
}

/// Hash `password` and print the result.
///
/// # Errors
///
/// Returns `AdminError` if the password is too short or hashing fails.
pub fn hash_password(password: &str) -> Result<(), AdminError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminError::PasswordTooShort);
    }

    let hash = services::hash_password(password).map_err(|e| AdminError::Hash(e.to_string()))?;
    tracing::info!("Password hashed. Set ADMIN_PASSWORD_HASH to the line below.");
    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            hash_password("short"),
            Err(AdminError::PasswordTooShort)
        ));
    }
}
