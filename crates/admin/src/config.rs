//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_USERNAME` - Login name of the single administrator
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the admin password
//!   (generate with `catalog-cli admin hash-password`)
//! - `CATALOG_SCRIPT_URL` - Script endpoint that writes to the catalog sheet
//! - `SHEETS_SPREADSHEET_ID` - Spreadsheet holding the catalog
//! - `SHEETS_API_KEY` - Read-only spreadsheet API key
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_SETTINGS_PATH` - Settings file (default: data/settings.json)
//! - `IMAGE_UPLOAD_URL` - Image host upload endpoint (default: imgbb)
//! - `CATALOG_CURRENCY_SYMBOL` - Price prefix (default: ₹)
//! - `CATALOG_CATEGORIES` - Category labels, `key=Label;key=Label`
//! - `CATALOG_READY_TIMEOUT_MS` - Max wait for the product list (default: 10000)
//! - `CATALOG_RELOAD_DELAY_MS` - Delay before reloading after a write (default: 1000)
//! - `REMOTE_TIMEOUT_SECS` - Timeout for remote HTTP calls (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_IMAGE_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";
const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Administrator credentials
    pub auth: AdminAuthConfig,
    /// Remote catalog (spreadsheet) configuration
    pub catalog: CatalogConfig,
    /// Image host configuration
    pub image_host: ImageHostConfig,
    /// Where the settings file lives
    pub settings_path: PathBuf,
    /// Timeout applied to every remote HTTP call
    pub remote_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Administrator credentials.
///
/// Only the argon2 hash is held; the plain password never reaches the config.
#[derive(Clone)]
pub struct AdminAuthConfig {
    pub username: String,
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthConfig")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Spreadsheet-backed catalog configuration.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Script endpoint accepting `{action, data, id}` writes
    pub script_url: Url,
    /// Spreadsheet ID for the read path
    pub spreadsheet_id: String,
    /// Read-only spreadsheet API key
    pub sheets_api_key: SecretString,
    /// Currency prefix used when rendering prices
    pub currency_symbol: String,
    /// Category key to display label
    pub categories: BTreeMap<String, String>,
    /// Upper bound on waiting for the product list to load
    pub ready_timeout: Duration,
    /// Delay between a successful write and the follow-up reload
    pub reload_delay: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("script_url", &self.script_url.as_str())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheets_api_key", &"[REDACTED]")
            .field("currency_symbol", &self.currency_symbol)
            .field("categories", &self.categories)
            .field("ready_timeout", &self.ready_timeout)
            .field("reload_delay", &self.reload_delay)
            .finish()
    }
}

/// Image host configuration.
///
/// The API key is not part of the environment: it is entered on the settings
/// tab and persisted by [`crate::services::SettingsStore`].
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    pub upload_url: Url,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = parse_env("ADMIN_PORT", "3001")?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;

        let auth = AdminAuthConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let image_host = ImageHostConfig {
            upload_url: parse_url(
                "IMAGE_UPLOAD_URL",
                &get_env_or_default("IMAGE_UPLOAD_URL", DEFAULT_IMAGE_UPLOAD_URL),
            )?,
        };
        let settings_path =
            PathBuf::from(get_env_or_default("ADMIN_SETTINGS_PATH", DEFAULT_SETTINGS_PATH));
        let remote_timeout = Duration::from_secs(parse_env("REMOTE_TIMEOUT_SECS", "30")?);

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            auth,
            catalog,
            image_host,
            settings_path,
            remote_timeout,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminAuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = get_required_env("ADMIN_USERNAME")?;
        if username.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_USERNAME".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let hash = get_required_env("ADMIN_PASSWORD_HASH")?;
        validate_password_hash(&hash, "ADMIN_PASSWORD_HASH")?;

        Ok(Self {
            username,
            password_hash: SecretString::from(hash),
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let script_url = parse_url("CATALOG_SCRIPT_URL", &get_required_env("CATALOG_SCRIPT_URL")?)?;
        let categories = get_optional_env("CATALOG_CATEGORIES")
            .map(|raw| parse_categories(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            script_url,
            spreadsheet_id: get_required_env("SHEETS_SPREADSHEET_ID")?,
            sheets_api_key: get_validated_secret("SHEETS_API_KEY")?,
            currency_symbol: get_env_or_default("CATALOG_CURRENCY_SYMBOL", DEFAULT_CURRENCY_SYMBOL),
            categories,
            ready_timeout: Duration::from_millis(parse_env("CATALOG_READY_TIMEOUT_MS", "10000")?),
            reload_delay: Duration::from_millis(parse_env("CATALOG_RELOAD_DELAY_MS", "1000")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse `key=Label;key=Label` into a category lookup.
fn parse_categories(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, label) = entry.split_once('=').ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "CATALOG_CATEGORIES".to_string(),
                    format!("expected key=Label, got '{entry}'"),
                )
            })?;
            Ok((key.trim().to_string(), label.trim().to_string()))
        })
        .collect()
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check that a value is a PHC-formatted password hash.
fn validate_password_hash(hash: &str, var_name: &str) -> Result<(), ConfigError> {
    argon2::PasswordHash::new(hash).map(|_| ()).map_err(|e| {
        ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("not a PHC password hash ({e}); use `catalog-cli admin hash-password`"),
        )
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
