//! Storefront engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARIGOLD_API_BASE_URL` - Base URL of the REST backend (e.g., `https://api.marigold.example/api/v1`)
//!
//! ## Optional
//! - `MARIGOLD_STATE_DIR` - Directory for the durable vault (default: `.marigold`)
//! - `MARIGOLD_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront engine configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the REST backend.
    pub api_base_url: Url,
    /// Directory holding the durable vault (the local-storage analog).
    pub state_dir: PathBuf,
    /// Timeout applied to every backend request, in seconds.
    pub request_timeout_secs: u64,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., "production", "staging").
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("MARIGOLD_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MARIGOLD_API_BASE_URL".to_string(), e.to_string())
            })?;
        let state_dir = PathBuf::from(get_env_or_default("MARIGOLD_STATE_DIR", ".marigold"));
        let request_timeout_secs = get_env_or_default("MARIGOLD_REQUEST_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "MARIGOLD_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            api_base_url,
            state_dir,
            request_timeout_secs,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Build a configuration pointing at the given backend with defaults for
    /// everything else. Used by tests and embedders that do not read the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_base_url` is not a valid URL.
    pub fn for_backend(api_base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = api_base_url.parse::<Url>().map_err(|e| {
            ConfigError::InvalidEnvVar("api_base_url".to_string(), e.to_string())
        })?;
        Ok(Self {
            api_base_url,
            state_dir: PathBuf::from(".marigold"),
            request_timeout_secs: 30,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

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
