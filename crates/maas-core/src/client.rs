//! HTTP client plumbing for the MAAS REST API.
//!
//! [`ServiceClient`] owns the `reqwest` client, the versioned API root and the
//! OAuth credentials. Every call to [`ServiceClient::execute`] sends exactly
//! one request; there is no retry loop.

use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::Credentials;
use crate::config::MaasClientConfig;
use crate::error::{Error, Result};

/// Default request timeout in seconds.
pub const MAAS_DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts and connection pooling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(MAAS_DEFAULT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceClient`].
#[derive(Debug)]
pub struct ServiceClientBuilder {
    base_url: Url,
    credentials: Credentials,
    http_config: ClientConfig,
    user_agent: Option<String>,
    tls_verify: bool,
}

impl ServiceClientBuilder {
    /// Create a builder for an already-resolved API root and credentials.
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            http_config: ClientConfig::new(),
            user_agent: None,
            tls_verify: true,
        }
    }

    /// Create a builder from a validated [`MaasClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint or API key is malformed.
    pub fn from_config(config: &MaasClientConfig) -> Result<Self> {
        let base_url = config.api_url()?;
        let credentials = Credentials::parse(&config.api_key)?;
        let http_config = ClientConfig::new().with_timeout(config.timeout());

        Ok(Self::new(base_url, credentials)
            .with_http_config(http_config)
            .with_tls_verify(config.tls_verify))
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<ServiceClient> {
        let mut builder = ClientBuilder::new()
            .timeout(self.http_config.timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT))
            .gzip(self.http_config.enable_compression);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if !self.tls_verify {
            warn!("TLS verification disabled for MAAS client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build MAAS HTTP client: {err}")))?;

        Ok(ServiceClient {
            http,
            base_url: self.base_url,
            credentials: Arc::new(self.credentials),
            enable_logging: self.http_config.enable_logging,
        })
    }
}

/// Authenticated HTTP client bound to one MAAS API root.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    credentials: Arc<Credentials>,
    enable_logging: bool,
}

impl ServiceClient {
    /// Return the versioned API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path against the API root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the path cannot be joined.
    pub fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid MAAS path `{path}`: {err}")))
    }

    /// Send one signed request and return the successful response.
    ///
    /// `customize` attaches headers or a body; `map_status` turns an
    /// unsuccessful status and its body text into an [`Error`].
    ///
    /// # Errors
    ///
    /// Returns the mapped error for non-2xx statuses, or a transport error.
    pub async fn execute<C, M>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        customize: C,
        map_status: M,
    ) -> Result<Response>
    where
        C: FnOnce(RequestBuilder) -> RequestBuilder,
        M: FnOnce(StatusCode, String) -> Error,
    {
        let url = self.build_url(path)?;

        let mut request = self.http.request(method.clone(), url);
        if !params.is_empty() {
            request = request.query(params);
        }
        request = request.header(
            reqwest::header::AUTHORIZATION,
            self.credentials.authorization_header(),
        );
        request = customize(request);

        if self.enable_logging {
            info!(%method, path, ?params, "MAAS request");
        }

        let response = request.send().await.map_err(|err| {
            let error = Error::from(err);
            warn!(%method, path, error = %error, "MAAS request failed");
            error
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%method, path, %status, "MAAS response");
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let error = map_status(status, text);

        if error.should_log() {
            warn!(%method, path, %status, code = error.error_code(), "MAAS request rejected");
        } else {
            debug!(%method, path, %status, code = error.error_code(), "MAAS request rejected");
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::map_status_to_error;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ServiceClient {
        let config = MaasClientConfig::new(format!("{}/MAAS", server.uri()), "ck:tk:ts").unwrap();
        ServiceClientBuilder::from_config(&config)
            .unwrap()
            .with_user_agent("maas-core-test")
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(MAAS_DEFAULT_TIMEOUT));
        assert_eq!(config.pool_max_idle_per_host, DEFAULT_POOL_MAX_IDLE_PER_HOST);
        assert!(config.enable_logging);
        assert!(config.enable_compression);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_logging(false)
            .with_compression(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_logging);
        assert!(!config.enable_compression);
    }

    #[test]
    fn test_from_config_rejects_bad_key() {
        let config = MaasClientConfig::new("http://maas:5240/MAAS", "not-a-key").unwrap();
        let result = ServiceClientBuilder::from_config(&config);
        assert!(matches!(result, Err(Error::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn execute_signs_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MAAS/api/2.0/machines/"))
            .and(query_param("hostname", "node-1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .execute(
                Method::GET,
                "machines/",
                &[("hostname", "node-1".to_string())],
                |request| request,
                |status, text| map_status_to_error("machines", status, text),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn execute_maps_status_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/MAAS/api/2.0/machines/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .execute(
                Method::POST,
                "machines/",
                &[("op", "allocate".to_string())],
                |request| request,
                |status, text| map_status_to_error("allocate", status, text),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(msg) if msg.contains("maintenance")));
    }
}
