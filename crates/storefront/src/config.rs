//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional.
//! - `MARKETSTALL_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKETSTALL_PORT` - Listen port (default: 3000)
//! - `MARKETSTALL_CART_DIR` - Directory for persisted carts (default: .marketstall/carts)
//! - `MARKETSTALL_CATALOG_PATH` - JSON file of listings (default: built-in demo catalog)
//! - `MARKETSTALL_DEFAULT_COUNTRY` - Shipping country when none is given (default: United States)
//! - `MARKETSTALL_SECURE_COOKIES` - Mark the session cookie `Secure` (default: false)
//! - `MARKETSTALL_LOG_JSON` - Emit logs as JSON lines (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_CART_DIR: &str = ".marketstall/carts";
const DEFAULT_COUNTRY: &str = "United States";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding one JSON file per cart
    pub cart_dir: PathBuf,
    /// Listings file; `None` uses the demo catalog
    pub catalog_path: Option<PathBuf>,
    /// Country applied to shipping forms that leave it blank
    pub default_country: String,
    /// Whether the session cookie requires HTTPS
    pub secure_cookies: bool,
    /// Structured JSON logs instead of human-readable text
    pub log_json: bool,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry configuration.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<SecretString>,
    pub environment: Option<String>,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let host = or_default("MARKETSTALL_HOST", DEFAULT_HOST)
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETSTALL_HOST".to_string(), e.to_string()))?;
        let port = or_default("MARKETSTALL_PORT", DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETSTALL_PORT".to_string(), e.to_string()))?;
        let flag = |key: &str| var(key).map_or(Ok(false), |value| parse_bool(key, &value));
        let secure_cookies = flag("MARKETSTALL_SECURE_COOKIES")?;
        let log_json = flag("MARKETSTALL_LOG_JSON")?;

        Ok(Self {
            host,
            port,
            cart_dir: PathBuf::from(or_default("MARKETSTALL_CART_DIR", DEFAULT_CART_DIR)),
            catalog_path: var("MARKETSTALL_CATALOG_PATH").map(PathBuf::from),
            default_country: or_default("MARKETSTALL_DEFAULT_COUNTRY", DEFAULT_COUNTRY),
            secure_cookies,
            log_json,
            sentry: SentryConfig {
                dsn: var("SENTRY_DSN").map(SecretString::from),
                environment: var("SENTRY_ENVIRONMENT"),
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            cart_dir: PathBuf::from(DEFAULT_CART_DIR),
            catalog_path: None,
            default_country: DEFAULT_COUNTRY.to_string(),
            secure_cookies: false,
            log_json: false,
            sentry: SentryConfig::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}
