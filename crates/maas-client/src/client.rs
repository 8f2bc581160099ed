//! Client set: the entry point holding the endpoint and credentials.

use crate::dns::DnsResources;
use crate::machine::Machines;
use crate::transport::{HttpTransport, HttpTransportBuilder, Transport};
use crate::Result;
use maas_core::client::ClientConfig;
use maas_core::config::MaasClientConfig;
use std::sync::Arc;
use tracing::debug;

/// Builder for [`ClientSet`].
#[derive(Debug)]
pub struct ClientSetBuilder {
    inner: HttpTransportBuilder,
}

impl ClientSetBuilder {
    /// Create a builder from a validated configuration.
    pub fn new(config: &MaasClientConfig) -> Result<Self> {
        Ok(Self {
            inner: HttpTransportBuilder::new(config)?,
        })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Build the client set.
    pub fn build(self) -> Result<ClientSet> {
        let transport: HttpTransport = self.inner.build()?;
        debug!(base_url = %transport.base_url(), "MAAS client ready");
        Ok(ClientSet::with_transport(Arc::new(transport)))
    }
}

/// Entry point to the MAAS resource collections.
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct ClientSet {
    transport: Arc<dyn Transport>,
}

impl ClientSet {
    /// Authenticated client for `endpoint` using a MAAS API key.
    pub fn new_authenticated(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let config = MaasClientConfig::new(endpoint, api_key)?;
        Self::from_config(&config)
    }

    /// Client configured from `MAAS_ENDPOINT` and `MAAS_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let config = MaasClientConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Client built from an explicit configuration.
    pub fn from_config(config: &MaasClientConfig) -> Result<Self> {
        ClientSetBuilder::new(config)?.build()
    }

    /// Start a builder pre-populated with the configuration.
    pub fn builder(config: &MaasClientConfig) -> Result<ClientSetBuilder> {
        ClientSetBuilder::new(config)
    }

    /// Client that sends every request through `transport`.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Machine operations.
    #[must_use]
    pub fn machines(&self) -> Machines {
        Machines::new(self.transport.clone())
    }

    /// DNS resource operations.
    #[must_use]
    pub fn dns_resources(&self) -> DnsResources {
        DnsResources::new(self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::Error;

    #[test]
    fn new_authenticated_rejects_bad_key() {
        let result = ClientSet::new_authenticated("http://maas:5240/MAAS", "only:two");
        assert!(matches!(result, Err(Error::InvalidCredentials(_))));
    }

    #[test]
    fn new_authenticated_rejects_bad_endpoint() {
        let result = ClientSet::new_authenticated("maas", "a:b:c");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn client_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ClientSet>();
        assert_send_sync::<Machines>();
    }
}
