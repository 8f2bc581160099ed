//! Configuration structures for MAAS clients.
//!
//! This module provides the configuration needed to reach a MAAS region
//! controller: its endpoint, the API key and transport settings.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the MAAS endpoint URL.
pub const ENDPOINT_ENV: &str = "MAAS_ENDPOINT";

/// Environment variable holding the MAAS API key.
pub const API_KEY_ENV: &str = "MAAS_API_KEY";

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "2.0";

/// Configuration for a MAAS client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MaasClientConfig {
    /// Region controller URL (e.g. `http://maas.example.com:5240/MAAS`)
    #[validate(url)]
    pub endpoint: String,

    /// API key in `consumer_key:token_key:token_secret` form
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// REST API version segment
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl MaasClientConfig {
    /// Create a new client configuration with required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a URL or the key is empty.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: default_api_version(),
            tls_verify: default_tls_verify(),
            request_timeout_secs: default_request_timeout_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Read the endpoint and API key from `MAAS_ENDPOINT` and `MAAS_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if either variable is unset or empty.
    pub fn from_env() -> Result<Self, Error> {
        let endpoint = read_env(ENDPOINT_ENV)?;
        let api_key = read_env(API_KEY_ENV)?;
        Self::new(endpoint, api_key)
    }

    /// Override the REST API version segment.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the versioned API root, e.g. `http://host:5240/MAAS/api/2.0/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be parsed.
    pub fn api_url(&self) -> Result<Url, Error> {
        let mut endpoint = self.endpoint.trim_end_matches('/').to_string();
        endpoint.push('/');
        let base = Url::parse(&endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid MAAS endpoint: {e}")))?;
        base.join(&format!("api/{}/", self.api_version))
            .map_err(|e| Error::ConfigError(format!("Invalid MAAS API version: {e}")))
    }
}

fn read_env(name: &str) -> Result<String, Error> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::ConfigError(format!(
            "{ENDPOINT_ENV} and {API_KEY_ENV} environment variables must be set ({name} is missing)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "ck:tk:ts";

    #[test]
    fn test_config_new() {
        let config = MaasClientConfig::new("http://maas.example.com:5240/MAAS", KEY).unwrap();
        assert_eq!(config.endpoint, "http://maas.example.com:5240/MAAS");
        assert_eq!(config.api_version, "2.0");
        assert!(config.tls_verify);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_config_invalid_url() {
        assert!(MaasClientConfig::new("not-a-url", KEY).is_err());
    }

    #[test]
    fn test_config_empty_key() {
        let result = MaasClientConfig::new("http://maas:5240/MAAS", "");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = MaasClientConfig::new("https://maas.example.com/MAAS", KEY)
            .unwrap()
            .with_api_version("2.1")
            .with_tls_verify(false)
            .with_timeout(60);

        assert_eq!(config.api_version, "2.1");
        assert!(!config.tls_verify);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_api_url_appends_version() {
        let config = MaasClientConfig::new("http://maas:5240/MAAS", KEY).unwrap();
        assert_eq!(
            config.api_url().unwrap().as_str(),
            "http://maas:5240/MAAS/api/2.0/"
        );

        let config = MaasClientConfig::new("http://maas:5240/MAAS/", KEY).unwrap();
        assert_eq!(
            config.api_url().unwrap().as_str(),
            "http://maas:5240/MAAS/api/2.0/"
        );
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = MaasClientConfig::new("http://maas:5240/MAAS", KEY).unwrap();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 301;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_skips_key() {
        let config = MaasClientConfig::new("http://maas:5240/MAAS", KEY).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("ck:tk:ts"));

        let deserialized: MaasClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.endpoint, config.endpoint);
        assert!(deserialized.api_key.is_empty());
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: MaasClientConfig =
            serde_json::from_str(r#"{"endpoint": "http://maas/MAAS", "api_key": "a:b:c"}"#)
                .unwrap();
        assert_eq!(config.api_version, "2.0");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }
}
