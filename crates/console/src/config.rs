//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PV_API_URL` - Base URL of the voucher API (default: `http://localhost:5000`)
//! - `PV_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `PV_CREDENTIAL_PATH` - File holding the persisted credential
//!   (default: `$HOME/.payment-voucher/credentials.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default API base URL (local development server).
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Directory (under `$HOME`) that holds the credential file.
const CREDENTIAL_DIR: &str = ".payment-voucher";

/// Credential file name.
const CREDENTIAL_FILE: &str = "credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL every API path is joined onto.
    pub api_url: Url,
    /// Bound after which a request fails as a network error.
    pub request_timeout: Duration,
    /// Location of the persisted credential slot.
    pub credential_path: PathBuf,
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(
            &lookup("PV_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let timeout_secs = match lookup("PV_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("PV_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PV_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let credential_path = lookup("PV_CREDENTIAL_PATH").map_or_else(
            || default_credential_path(lookup("HOME")),
            PathBuf::from,
        );

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            credential_path,
        })
    }

    /// Configuration pointing at `api_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn for_api(api_url: &str, credential_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_path: credential_path.into(),
        })
    }
}

/// Parse and validate the API base URL.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("PV_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "PV_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "PV_API_URL".to_string(),
            "must be a base URL".to_string(),
        ));
    }

    Ok(url)
}

/// Default credential location, relative to the working directory when
/// `HOME` is unset.
fn default_credential_path(home: Option<String>) -> PathBuf {
    let mut path = home.map(PathBuf::from).unwrap_or_default();
    path.push(CREDENTIAL_DIR);
    path.push(CREDENTIAL_FILE);
    path
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ConsoleConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConsoleConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HOME", "/home/clerk")]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(
            config.credential_path,
            PathBuf::from("/home/clerk/.payment-voucher/credentials.json")
        );
    }

    #[test]
    fn test_default_credential_path_without_home() {
        let config = load(&[]).unwrap();
        assert_eq!(
            config.credential_path,
            PathBuf::from(".payment-voucher/credentials.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PV_API_URL", "https://vouchers.example.com"),
            ("PV_REQUEST_TIMEOUT_SECS", "3"),
            ("PV_CREDENTIAL_PATH", "/tmp/pv.json"),
        ])
        .unwrap();
        assert_eq!(config.api_url.host_str(), Some("vouchers.example.com"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.credential_path, PathBuf::from("/tmp/pv.json"));
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            load(&[("PV_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[("PV_API_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = load(&[("PV_REQUEST_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_rejects_non_numeric_timeout() {
        assert!(load(&[("PV_REQUEST_TIMEOUT_SECS", "ten")]).is_err());
    }
}
