//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPFRONT_API_URL` - Backend base URL (default: http://localhost:3000)
//! - `SHOPFRONT_CACHE_DIR` - Directory for the cart cache (in-memory if unset)
//! - `SHOPFRONT_LOGIN_ERROR_MS` - How long a rejected login message shows (default: 4500)
//! - `SHOPFRONT_REGISTER_ERROR_MS` - How long a rejected registration message shows (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_LOGIN_ERROR_MS: &str = "4500";
const DEFAULT_REGISTER_ERROR_MS: &str = "3000";

/// Configuration errors that can occur during loading.
///
/// Every variable is optional, so the only failure is a value that is set
/// but cannot be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_url: Url,
    /// Cart cache directory; `None` keeps the cache in memory
    pub cache_dir: Option<PathBuf>,
    /// Display time of a rejected login message
    pub login_error_display: Duration,
    /// Display time of a rejected registration message
    pub register_error_display: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let api_url = env.get_or_default("SHOPFRONT_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPFRONT_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            cache_dir: env.get_optional("SHOPFRONT_CACHE_DIR").map(PathBuf::from),
            login_error_display: env.get_millis("SHOPFRONT_LOGIN_ERROR_MS", DEFAULT_LOGIN_ERROR_MS)?,
            register_error_display: env
                .get_millis("SHOPFRONT_REGISTER_ERROR_MS", DEFAULT_REGISTER_ERROR_MS)?,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cache_dir: None,
            login_error_display: crate::flows::LOGIN_ERROR_DISPLAY,
            register_error_display: crate::flows::REGISTER_ERROR_DISPLAY,
            sentry_dsn: None,
        }
    }
}

#[allow(clippy::expect_used)]
fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable. Blank values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a duration given in milliseconds.
    fn get_millis(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        self.get_or_default(key, default)
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:3000/");
        assert!(config.cache_dir.is_none());
        assert_eq!(config.login_error_display, Duration::from_millis(4500));
        assert_eq!(config.register_error_display, Duration::from_secs(3));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_default_impl_matches_empty_environment() {
        let config = ClientConfig::default();
        let loaded = load(&[]).unwrap();
        assert_eq!(config.api_url, loaded.api_url);
        assert_eq!(config.login_error_display, loaded.login_error_display);
        assert_eq!(config.register_error_display, loaded.register_error_display);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SHOPFRONT_API_URL", "https://api.shop.test/v1/"),
            ("SHOPFRONT_CACHE_DIR", "/tmp/shopfront"),
            ("SHOPFRONT_LOGIN_ERROR_MS", "100"),
            ("SENTRY_DSN", "https://key@sentry.test/1"),
        ])
        .unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.shop.test/v1/");
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/shopfront")));
        assert_eq!(config.login_error_display, Duration::from_millis(100));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("SHOPFRONT_CACHE_DIR", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert!(config.cache_dir.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = load(&[("SHOPFRONT_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPFRONT_API_URL"));
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let err = load(&[("SHOPFRONT_REGISTER_ERROR_MS", "3s")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPFRONT_REGISTER_ERROR_MS"));
    }

    #[test]
    fn test_unset_variables_never_fail() {
        // Each variable alone set to a blank value still loads.
        for key in [
            "SHOPFRONT_API_URL",
            "SHOPFRONT_CACHE_DIR",
            "SHOPFRONT_LOGIN_ERROR_MS",
            "SHOPFRONT_REGISTER_ERROR_MS",
            "SENTRY_DSN",
        ] {
            assert!(load(&[(key, "")]).is_ok(), "{key}");
        }

        let ConfigError::InvalidEnvVar(key, reason) =
            load(&[("SHOPFRONT_LOGIN_ERROR_MS", "-1")]).unwrap_err();
        assert_eq!(key, "SHOPFRONT_LOGIN_ERROR_MS");
        assert!(!reason.is_empty());
    }
}
