//! MAAS resource representations and list filters.

use maas_core::id::{DnsResourceId, SystemId};
use maas_core::query::Params;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treat JSON `null` the same as a missing field.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Machine lifecycle status as reported in `status_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MachineStatus {
    /// Enlisted, not yet commissioned.
    New,
    /// Commissioning in progress.
    Commissioning,
    /// Commissioning failed.
    FailedCommissioning,
    /// In the unallocated pool.
    Ready,
    /// Reserved for a user.
    Allocated,
    /// Deployment accepted and in progress.
    Deploying,
    /// Deployment finished.
    Deployed,
    /// Deployment failed.
    FailedDeployment,
    /// Release in progress.
    Releasing,
    /// Release failed.
    FailedReleasing,
    /// Marked broken by an operator.
    Broken,
    /// Any status this client does not model.
    Other(String),
}

impl MachineStatus {
    /// The `status_name` string MAAS uses for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "New",
            Self::Commissioning => "Commissioning",
            Self::FailedCommissioning => "Failed commissioning",
            Self::Ready => "Ready",
            Self::Allocated => "Allocated",
            Self::Deploying => "Deploying",
            Self::Deployed => "Deployed",
            Self::FailedDeployment => "Failed deployment",
            Self::Releasing => "Releasing",
            Self::FailedReleasing => "Releasing failed",
            Self::Broken => "Broken",
            Self::Other(name) => name,
        }
    }

    /// Lowercase alias accepted by the `status` filter of `GET machines/`.
    #[must_use]
    pub fn filter_value(&self) -> String {
        match self {
            Self::FailedReleasing => "failed_releasing".to_string(),
            other => other.as_str().to_ascii_lowercase().replace(' ', "_"),
        }
    }

    /// True while the service is still moving the machine between states.
    #[must_use]
    pub const fn is_transitional(&self) -> bool {
        matches!(self, Self::Commissioning | Self::Deploying | Self::Releasing)
    }

    /// True for the failure states.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::FailedCommissioning
                | Self::FailedDeployment
                | Self::FailedReleasing
                | Self::Broken
        )
    }
}

impl Default for MachineStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for MachineStatus {
    fn from(name: String) -> Self {
        match name.as_str() {
            "New" => Self::New,
            "Commissioning" => Self::Commissioning,
            "Failed commissioning" => Self::FailedCommissioning,
            "Ready" => Self::Ready,
            "Allocated" => Self::Allocated,
            "Deploying" => Self::Deploying,
            "Deployed" => Self::Deployed,
            "Failed deployment" => Self::FailedDeployment,
            "Releasing" => Self::Releasing,
            "Releasing failed" => Self::FailedReleasing,
            "Broken" => Self::Broken,
            _ => Self::Other(name),
        }
    }
}

impl From<MachineStatus> for String {
    fn from(status: MachineStatus) -> Self {
        match status {
            MachineStatus::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power state reported by the machine's BMC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Powered on.
    On,
    /// Powered off.
    Off,
    /// The BMC reported an error.
    Error,
    /// Not known (also used for unrecognised values).
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Where a deployed OS lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployMode {
    /// Runs from memory; discarded on power-off.
    Ephemeral,
    /// Installed to disk.
    Persistent,
}

impl DeployMode {
    /// Map the `ephemeral_deploy` flag to a mode.
    #[must_use]
    pub const fn from_ephemeral(ephemeral: bool) -> Self {
        if ephemeral {
            Self::Ephemeral
        } else {
            Self::Persistent
        }
    }

    /// True for [`DeployMode::Ephemeral`].
    #[must_use]
    pub const fn is_ephemeral(self) -> bool {
        matches!(self, Self::Ephemeral)
    }

    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Persistent => "persistent",
        }
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Zone name.
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,
}

impl Zone {
    /// Zone name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Resource pool a machine belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Pool id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Pool name.
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,
}

/// Machine as returned by the `machines` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineData {
    /// System ID.
    pub system_id: SystemId,
    /// Short hostname.
    #[serde(default, deserialize_with = "null_to_default")]
    pub hostname: String,
    /// Fully qualified domain name.
    #[serde(default, deserialize_with = "null_to_default")]
    pub fqdn: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,
    /// Lifecycle status.
    #[serde(rename = "status_name", default, deserialize_with = "null_to_default")]
    pub status: MachineStatus,
    /// BMC power state.
    #[serde(default, deserialize_with = "null_to_default")]
    pub power_state: PowerState,
    /// Availability zone.
    #[serde(default, deserialize_with = "null_to_default")]
    pub zone: Zone,
    /// Resource pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<ResourcePool>,
    /// Assigned IP addresses.
    #[serde(default, deserialize_with = "null_to_default")]
    pub ip_addresses: Vec<String>,
    /// Deployed OS (e.g. `ubuntu`, `custom`).
    #[serde(default, deserialize_with = "null_to_default")]
    pub osystem: String,
    /// Deployed release (e.g. `jammy`).
    #[serde(default, deserialize_with = "null_to_default")]
    pub distro_series: String,
    /// Swap size in bytes; `None` lets the installer decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_size: Option<i64>,
    /// Whether the last deployment ran from memory.
    #[serde(default, deserialize_with = "null_to_default")]
    pub ephemeral_deploy: bool,
    /// Kernel selected for deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hwe_kernel: Option<String>,
    /// Tags applied to the machine.
    #[serde(default, deserialize_with = "null_to_default")]
    pub tag_names: Vec<String>,
    /// Architecture (e.g. `amd64/generic`).
    #[serde(default, deserialize_with = "null_to_default")]
    pub architecture: String,
    /// CPU count.
    #[serde(default, deserialize_with = "null_to_default")]
    pub cpu_count: u32,
    /// Memory in MiB.
    #[serde(default, deserialize_with = "null_to_default")]
    pub memory: u64,
}

impl MachineData {
    /// Placeholder for a machine that has only been named, not fetched.
    #[must_use]
    pub fn unfetched(system_id: SystemId) -> Self {
        Self {
            system_id,
            hostname: String::new(),
            fqdn: String::new(),
            description: String::new(),
            status: MachineStatus::default(),
            power_state: PowerState::default(),
            zone: Zone::default(),
            pool: None,
            ip_addresses: Vec::new(),
            osystem: String::new(),
            distro_series: String::new(),
            swap_size: None,
            ephemeral_deploy: false,
            hwe_kernel: None,
            tag_names: Vec::new(),
            architecture: String::new(),
            cpu_count: 0,
            memory: 0,
        }
    }
}

/// Filters for `GET machines/`.
#[derive(Debug, Default, Clone)]
pub struct MachineListParams {
    /// Filter by hostname.
    pub hostname: Option<String>,
    /// Filter by system ID.
    pub system_id: Option<SystemId>,
    /// Filter by zone name.
    pub zone: Option<String>,
    /// Filter by resource pool name.
    pub pool: Option<String>,
    /// Filter by lifecycle status.
    pub status: Option<MachineStatus>,
    /// Filter by MAC address.
    pub mac_address: Option<String>,
    /// Filter by DNS domain.
    pub domain: Option<String>,
    /// Filter by owner username.
    pub owner: Option<String>,
}

impl MachineListParams {
    /// Convert the filters into query pairs.
    #[must_use]
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.push_opt("hostname", self.hostname.as_deref());
        params.push_opt("id", self.system_id.as_ref());
        params.push_opt("zone", self.zone.as_deref());
        params.push_opt("pool", self.pool.as_deref());
        params.push_opt("status", self.status.as_ref().map(MachineStatus::filter_value));
        params.push_opt("mac_address", self.mac_address.as_deref());
        params.push_opt("domain", self.domain.as_deref());
        params.push_opt("owner", self.owner.as_deref());
        params
    }
}

/// Address attached to a DNS resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsIpAddress {
    /// Static IP address id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Address text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// DNS resource as returned by the `dnsresources` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResourceData {
    /// Resource id.
    pub id: DnsResourceId,
    /// Fully qualified domain name.
    #[serde(default, deserialize_with = "null_to_default")]
    pub fqdn: String,
    /// TTL for address records; `None` inherits the domain default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_ttl: Option<u32>,
    /// Addresses the name resolves to.
    #[serde(default, deserialize_with = "null_to_default")]
    pub ip_addresses: Vec<DnsIpAddress>,
}

impl DnsResourceData {
    /// Placeholder for a resource that has only been named, not fetched.
    #[must_use]
    pub fn unfetched(id: DnsResourceId) -> Self {
        Self {
            id,
            fqdn: String::new(),
            address_ttl: None,
            ip_addresses: Vec::new(),
        }
    }
}

/// Key for filtering DNS resources by FQDN.
pub const FQDN_KEY: &str = "fqdn";

/// Filters for `GET dnsresources/`.
#[derive(Debug, Default, Clone)]
pub struct DnsResourceListParams {
    /// Filter by FQDN.
    pub fqdn: Option<String>,
    /// Filter by domain name.
    pub domain: Option<String>,
    /// Filter by record name within the domain.
    pub name: Option<String>,
    /// Filter by record type (e.g. `A`, `AAAA`).
    pub rrtype: Option<String>,
}

impl DnsResourceListParams {
    /// Create an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match this FQDN.
    #[must_use]
    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    /// Only match resources in this domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Convert the filters into query pairs.
    #[must_use]
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.push_opt(FQDN_KEY, self.fqdn.as_deref());
        params.push_opt("domain", self.domain.as_deref());
        params.push_opt("name", self.name.as_deref());
        params.push_opt("rrtype", self.rrtype.as_deref());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn machine_status_round_trips_names() {
        let status: MachineStatus = serde_json::from_value(json!("Failed deployment")).unwrap();
        assert_eq!(status, MachineStatus::FailedDeployment);
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("Failed deployment"));

        let status: MachineStatus = serde_json::from_value(json!("Rescue mode")).unwrap();
        assert_eq!(status, MachineStatus::Other("Rescue mode".to_string()));
        assert_eq!(status.to_string(), "Rescue mode");
    }

    #[test]
    fn machine_status_predicates() {
        assert!(MachineStatus::Deploying.is_transitional());
        assert!(!MachineStatus::Deployed.is_transitional());
        assert!(MachineStatus::FailedDeployment.is_failed());
        assert!(!MachineStatus::Ready.is_failed());
    }

    #[test]
    fn power_state_unknown_values() {
        let state: PowerState = serde_json::from_value(json!("on")).unwrap();
        assert_eq!(state, PowerState::On);
        let state: PowerState = serde_json::from_value(json!("flickering")).unwrap();
        assert_eq!(state, PowerState::Unknown);
    }

    #[test]
    fn deploy_mode_from_flag() {
        assert_eq!(DeployMode::from_ephemeral(true), DeployMode::Ephemeral);
        assert_eq!(DeployMode::from_ephemeral(false).to_string(), "persistent");
    }

    #[test]
    fn machine_data_tolerates_nulls() {
        let data: MachineData = serde_json::from_value(json!({
            "system_id": "abc123",
            "hostname": null,
            "osystem": null,
            "distro_series": "",
            "status_name": null,
            "power_state": null,
            "zone": null,
            "swap_size": null,
            "ip_addresses": null
        }))
        .unwrap();
        assert_eq!(data.system_id.as_str(), "abc123");
        assert!(data.hostname.is_empty());
        assert_eq!(data.power_state, PowerState::Unknown);
        assert!(data.swap_size.is_none());
        assert!(data.ip_addresses.is_empty());
    }

    #[test]
    fn machine_list_params_pairs() {
        let params = MachineListParams {
            hostname: Some("node-1".into()),
            zone: Some("az1".into()),
            status: Some(MachineStatus::Deployed),
            ..MachineListParams::default()
        };
        assert_eq!(
            params.to_params().into_pairs(),
            vec![
                ("hostname", "node-1".to_string()),
                ("zone", "az1".to_string()),
                ("status", "deployed".to_string()),
            ]
        );
    }

    #[test]
    fn status_filter_values() {
        assert_eq!(MachineStatus::Ready.filter_value(), "ready");
        assert_eq!(MachineStatus::FailedDeployment.filter_value(), "failed_deployment");
        assert_eq!(MachineStatus::FailedReleasing.filter_value(), "failed_releasing");
        assert_eq!(
            MachineStatus::from("Disk erasing".to_string()).filter_value(),
            "disk_erasing"
        );
    }

    #[test]
    fn dns_list_params_fqdn() {
        let params = DnsResourceListParams::new().with_fqdn("web.maas");
        assert_eq!(params.to_params().get(FQDN_KEY), Some("web.maas"));
        assert!(DnsResourceListParams::new().to_params().is_empty());
    }
}
