//! DNS resource collection, handles and builders.

use crate::models::{DnsResourceData, DnsResourceListParams};
use crate::transport::{ApiRequest, Operation, Transport};
use crate::Result;
use maas_core::id::DnsResourceId;
use maas_core::query::Params;
use maas_core::Error;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

fn dns_resource_path(id: DnsResourceId) -> String {
    format!("dnsresources/{id}/")
}

fn decode_dns_resource(transport: &Arc<dyn Transport>, value: Value) -> Result<DnsResource> {
    let data: DnsResourceData = serde_json::from_value(value)
        .map_err(|err| Error::ParseError(format!("Failed to parse DNS resource: {err}")))?;
    Ok(DnsResource::from_data(transport.clone(), data))
}

/// MAAS takes address lists as a single space-separated field.
fn join_addresses(addresses: &[String]) -> String {
    addresses.join(" ")
}

/// Entry point for DNS resource operations.
#[derive(Clone)]
pub struct DnsResources {
    transport: Arc<dyn Transport>,
}

impl DnsResources {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// List DNS resources; `None` returns the whole collection.
    pub async fn list(&self, filters: Option<&DnsResourceListParams>) -> Result<Vec<DnsResource>> {
        let query = filters.map(DnsResourceListParams::to_params).unwrap_or_default();
        let request =
            ApiRequest::new(Operation::ListDnsResources, "dnsresources/").with_query(query);
        let value = self.transport.send(request).await?;
        let resources: Vec<DnsResourceData> = serde_json::from_value(value).map_err(|err| {
            Error::ParseError(format!("Failed to parse DNS resource list: {err}"))
        })?;

        Ok(resources
            .into_iter()
            .map(|data| DnsResource::from_data(self.transport.clone(), data))
            .collect())
    }

    /// Handle for a known id without contacting the service.
    #[must_use]
    pub fn dns_resource(&self, id: DnsResourceId) -> DnsResource {
        DnsResource::from_data(self.transport.clone(), DnsResourceData::unfetched(id))
    }

    /// Start building a new DNS resource.
    #[must_use]
    pub fn builder(&self) -> DnsResourceBuilder {
        DnsResourceBuilder::new(self.transport.clone())
    }
}

/// Snapshot of one DNS resource.
#[derive(Clone)]
pub struct DnsResource {
    transport: Arc<dyn Transport>,
    data: DnsResourceData,
}

impl DnsResource {
    fn from_data(transport: Arc<dyn Transport>, data: DnsResourceData) -> Self {
        Self { transport, data }
    }

    /// Raw snapshot data.
    #[must_use]
    pub fn data(&self) -> &DnsResourceData {
        &self.data
    }

    /// Resource id.
    #[must_use]
    pub fn id(&self) -> DnsResourceId {
        self.data.id
    }

    /// Fully qualified domain name.
    #[must_use]
    pub fn fqdn(&self) -> &str {
        &self.data.fqdn
    }

    /// Address record TTL.
    #[must_use]
    pub fn address_ttl(&self) -> Option<u32> {
        self.data.address_ttl
    }

    /// Addresses this name resolves to.
    #[must_use]
    pub fn ip_addresses(&self) -> Vec<&str> {
        self.data
            .ip_addresses
            .iter()
            .filter_map(|address| address.ip.as_deref())
            .collect()
    }

    /// Fetch a fresh snapshot.
    pub async fn get(&self) -> Result<DnsResource> {
        let request = ApiRequest::new(Operation::GetDnsResource, dns_resource_path(self.id()));
        let value = self.transport.send(request).await?;
        decode_dns_resource(&self.transport, value)
    }

    /// Start an update.
    #[must_use]
    pub fn modifier(&self) -> DnsResourceModifier {
        DnsResourceModifier::new(self.transport.clone(), self.id())
    }

    /// Delete the resource.
    pub async fn delete(&self) -> Result<()> {
        info!(id = %self.id(), fqdn = self.fqdn(), "deleting DNS resource");
        let request = ApiRequest::new(Operation::DeleteDnsResource, dns_resource_path(self.id()));
        self.transport.send(request).await.map(|_| ())
    }
}

impl fmt::Debug for DnsResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResource").field("data", &self.data).finish()
    }
}

/// Builder for `POST dnsresources/`.
#[must_use = "a builder does nothing until `create` is awaited"]
pub struct DnsResourceBuilder {
    transport: Arc<dyn Transport>,
    fqdn: Option<String>,
    name: Option<String>,
    domain: Option<String>,
    address_ttl: Option<u32>,
    ip_addresses: Vec<String>,
}

impl DnsResourceBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            fqdn: None,
            name: None,
            domain: None,
            address_ttl: None,
            ip_addresses: Vec::new(),
        }
    }

    /// Fully qualified name. Use this or `with_name` plus `with_domain`.
    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    /// Record name within `domain`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Domain for `name`.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// TTL for address records, in seconds.
    pub fn with_address_ttl(mut self, ttl: u32) -> Self {
        self.address_ttl = Some(ttl);
        self
    }

    /// Addresses the name should resolve to.
    pub fn with_ip_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ip_addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("fqdn", self.fqdn.as_deref());
        form.push_opt("name", self.name.as_deref());
        form.push_opt("domain", self.domain.as_deref());
        form.push_opt("address_ttl", self.address_ttl);
        if !self.ip_addresses.is_empty() {
            form.push("ip_addresses", join_addresses(&self.ip_addresses));
        }
        form
    }

    /// Create the resource.
    ///
    /// # Errors
    ///
    /// [`Error::ValidationError`] if neither an FQDN nor a name and domain
    /// were given; otherwise whatever the service reports.
    pub async fn create(self) -> Result<DnsResource> {
        if self.fqdn.is_none() && (self.name.is_none() || self.domain.is_none()) {
            return Err(Error::ValidationError(
                "a DNS resource needs an fqdn, or a name and a domain".to_string(),
            ));
        }

        debug!(fqdn = ?self.fqdn, "creating DNS resource");
        let request =
            ApiRequest::new(Operation::CreateDnsResource, "dnsresources/").with_form(self.form());
        let value = self.transport.send(request).await?;
        decode_dns_resource(&self.transport, value)
    }
}

/// Builder for `PUT dnsresources/{id}/`.
#[must_use = "a modifier does nothing until `modify` is awaited"]
pub struct DnsResourceModifier {
    transport: Arc<dyn Transport>,
    id: DnsResourceId,
    fqdn: Option<String>,
    address_ttl: Option<u32>,
    ip_addresses: Option<Vec<String>>,
}

impl DnsResourceModifier {
    fn new(transport: Arc<dyn Transport>, id: DnsResourceId) -> Self {
        Self {
            transport,
            id,
            fqdn: None,
            address_ttl: None,
            ip_addresses: None,
        }
    }

    /// Rename the resource.
    pub fn set_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    /// Change the address TTL.
    pub fn set_address_ttl(mut self, ttl: u32) -> Self {
        self.address_ttl = Some(ttl);
        self
    }

    /// Replace the address set.
    pub fn set_ip_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ip_addresses = Some(addresses.into_iter().map(Into::into).collect());
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("fqdn", self.fqdn.as_deref());
        form.push_opt("address_ttl", self.address_ttl);
        form.push_opt(
            "ip_addresses",
            self.ip_addresses.as_deref().map(join_addresses),
        );
        form
    }

    /// Apply the changes and return the updated snapshot.
    pub async fn modify(self) -> Result<DnsResource> {
        debug!(id = %self.id, "updating DNS resource");
        let request = ApiRequest::new(Operation::UpdateDnsResource, dns_resource_path(self.id))
            .with_form(self.form());
        let value = self.transport.send(request).await?;
        decode_dns_resource(&self.transport, value)
    }
}
