//! Request transport for MAAS resources.
//!
//! Builders describe a call as an [`ApiRequest`] and hand it to a
//! [`Transport`]. [`HttpTransport`] is the production implementation; tests
//! substitute a mock to observe exactly which calls a builder issues.

use crate::Result;
use async_trait::async_trait;
use maas_core::client::{ClientConfig, ServiceClient, ServiceClientBuilder};
use maas_core::config::MaasClientConfig;
use maas_core::error::map_status_to_error;
use maas_core::query::Params;
use maas_core::Error;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

const USER_AGENT: &str = concat!("maas-client/", env!("CARGO_PKG_VERSION"));

/// Remote operations exposed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET machines/`
    ListMachines,
    /// `GET machines/{system_id}/`
    GetMachine,
    /// `POST machines/?op=allocate`
    AllocateMachine,
    /// `PUT machines/{system_id}/`
    UpdateMachine,
    /// `POST machines/{system_id}/?op=commission`
    CommissionMachine,
    /// `POST machines/{system_id}/?op=deploy`
    DeployMachine,
    /// `POST machines/{system_id}/?op=release`
    ReleaseMachine,
    /// `GET dnsresources/`
    ListDnsResources,
    /// `GET dnsresources/{id}/`
    GetDnsResource,
    /// `POST dnsresources/`
    CreateDnsResource,
    /// `PUT dnsresources/{id}/`
    UpdateDnsResource,
    /// `DELETE dnsresources/{id}/`
    DeleteDnsResource,
}

impl Operation {
    /// Short name used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListMachines => "list machines",
            Self::GetMachine => "get machine",
            Self::AllocateMachine => "allocate machine",
            Self::UpdateMachine => "update machine",
            Self::CommissionMachine => "commission machine",
            Self::DeployMachine => "deploy machine",
            Self::ReleaseMachine => "release machine",
            Self::ListDnsResources => "list dns resources",
            Self::GetDnsResource => "get dns resource",
            Self::CreateDnsResource => "create dns resource",
            Self::UpdateDnsResource => "update dns resource",
            Self::DeleteDnsResource => "delete dns resource",
        }
    }

    /// HTTP method for this operation.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::ListMachines
            | Self::GetMachine
            | Self::ListDnsResources
            | Self::GetDnsResource => Method::GET,
            Self::UpdateMachine | Self::UpdateDnsResource => Method::PUT,
            Self::DeleteDnsResource => Method::DELETE,
            Self::AllocateMachine
            | Self::CommissionMachine
            | Self::DeployMachine
            | Self::ReleaseMachine
            | Self::CreateDnsResource => Method::POST,
        }
    }

    /// Value of the `op` query parameter, for operations that use one.
    #[must_use]
    pub const fn op(self) -> Option<&'static str> {
        match self {
            Self::AllocateMachine => Some("allocate"),
            Self::CommissionMachine => Some("commission"),
            Self::DeployMachine => Some("deploy"),
            Self::ReleaseMachine => Some("release"),
            _ => None,
        }
    }

    /// Translate an unsuccessful HTTP status into an [`Error`].
    #[must_use]
    pub fn map_status(self, status: StatusCode, text: String) -> Error {
        match (self, status) {
            (Self::AllocateMachine, StatusCode::CONFLICT) => Error::NoEligibleMachine(text),
            (Self::AllocateMachine, StatusCode::BAD_REQUEST) => Error::InvalidConstraint(text),
            _ => map_status_to_error(self.name(), status, text),
        }
    }
}

/// A single call against the MAAS API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Operation being performed.
    pub operation: Operation,
    /// Path relative to the versioned API root, with trailing slash.
    pub path: String,
    /// Query string filters.
    pub query: Params,
    /// Form-encoded body fields.
    pub form: Params,
}

impl ApiRequest {
    /// Create a request with no parameters.
    #[must_use]
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self {
            operation,
            path: path.into(),
            query: Params::new(),
            form: Params::new(),
        }
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    /// Attach form body parameters.
    #[must_use]
    pub fn with_form(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    /// Query pairs as sent on the wire, including `op`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(self.query.as_pairs().len() + 1);
        if let Some(op) = self.operation.op() {
            pairs.push(("op", op.to_string()));
        }
        pairs.extend(self.query.as_pairs().iter().cloned());
        pairs
    }
}

/// Executes [`ApiRequest`]s and returns the decoded JSON body.
///
/// Implementations must issue exactly one remote call per invocation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request. Empty response bodies decode to [`Value::Null`].
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    inner: ServiceClientBuilder,
}

impl HttpTransportBuilder {
    /// Create a builder from a validated configuration.
    pub fn new(config: &MaasClientConfig) -> Result<Self> {
        let inner = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let inner = self.inner.build()?;
        Ok(HttpTransport { inner })
    }
}

/// Transport that talks to a MAAS region controller over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    inner: ServiceClient,
}

impl HttpTransport {
    /// Return the versioned API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let operation = request.operation;
        let query = request.query_pairs();
        let form = request.form.into_pairs();

        let response = self
            .inner
            .execute(
                operation.method(),
                &request.path,
                &query,
                |mut builder| {
                    builder = builder.header("Accept", "application/json");
                    if !form.is_empty() {
                        builder = builder.form(&form);
                    }
                    builder
                },
                |status, text| operation.map_status(status, text),
            )
            .await?;

        let body = response.bytes().await.map_err(Error::from)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse MAAS response for `{}`: {err}",
                request.path
            ))
        })
    }
}
