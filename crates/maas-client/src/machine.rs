//! Machines collection, machine handles and the lifecycle builders.
//!
//! Every builder is consumed by its terminal method, which issues exactly one
//! request and returns a fresh [`Machine`] snapshot. Nothing here enforces
//! call ordering; the region controller validates each step.

use crate::models::{
    DeployMode, MachineData, MachineListParams, MachineStatus, PowerState, ResourcePool, Zone,
};
use crate::transport::{ApiRequest, Operation, Transport};
use crate::Result;
use maas_core::id::SystemId;
use maas_core::query::Params;
use maas_core::Error;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

fn machine_path(system_id: &SystemId) -> String {
    format!("machines/{system_id}/")
}

fn decode_machine(transport: &Arc<dyn Transport>, value: Value) -> Result<Machine> {
    let data: MachineData = serde_json::from_value(value)
        .map_err(|err| Error::ParseError(format!("Failed to parse machine: {err}")))?;
    Ok(Machine::from_data(transport.clone(), data))
}

/// Entry point for machine operations.
#[derive(Clone)]
pub struct Machines {
    transport: Arc<dyn Transport>,
}

impl Machines {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// List machines matching the filters.
    pub async fn list(&self, params: &MachineListParams) -> Result<Vec<Machine>> {
        let request =
            ApiRequest::new(Operation::ListMachines, "machines/").with_query(params.to_params());
        let value = self.transport.send(request).await?;
        let machines: Vec<MachineData> = serde_json::from_value(value)
            .map_err(|err| Error::ParseError(format!("Failed to parse machine list: {err}")))?;

        Ok(machines
            .into_iter()
            .map(|data| Machine::from_data(self.transport.clone(), data))
            .collect())
    }

    /// Handle for a known system ID without contacting the service.
    ///
    /// Accessors return empty values until [`Machine::get`] is called, but the
    /// builders can be used straight away.
    #[must_use]
    pub fn machine(&self, system_id: SystemId) -> Machine {
        Machine::from_data(self.transport.clone(), MachineData::unfetched(system_id))
    }

    /// Fetch a machine by system ID.
    pub async fn get(&self, system_id: &SystemId) -> Result<Machine> {
        let request = ApiRequest::new(Operation::GetMachine, machine_path(system_id));
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }

    /// Start an allocation request.
    #[must_use]
    pub fn allocator(&self) -> Allocator {
        Allocator::new(self.transport.clone())
    }
}

/// Snapshot of one remote machine.
///
/// The snapshot never changes; operations return a new `Machine`.
#[derive(Clone)]
pub struct Machine {
    transport: Arc<dyn Transport>,
    data: MachineData,
}

impl Machine {
    pub(crate) fn from_data(transport: Arc<dyn Transport>, data: MachineData) -> Self {
        Self { transport, data }
    }

    /// Raw snapshot data.
    #[must_use]
    pub fn data(&self) -> &MachineData {
        &self.data
    }

    /// System ID.
    #[must_use]
    pub fn system_id(&self) -> &SystemId {
        &self.data.system_id
    }

    /// Hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.data.hostname
    }

    /// Fully qualified domain name.
    #[must_use]
    pub fn fqdn(&self) -> &str {
        &self.data.fqdn
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.data.description
    }

    /// Lifecycle status at the time of the snapshot.
    #[must_use]
    pub fn status(&self) -> &MachineStatus {
        &self.data.status
    }

    /// Power state.
    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.data.power_state
    }

    /// Availability zone.
    #[must_use]
    pub fn zone(&self) -> &Zone {
        &self.data.zone
    }

    /// Resource pool, if reported.
    #[must_use]
    pub fn pool(&self) -> Option<&ResourcePool> {
        self.data.pool.as_ref()
    }

    /// Assigned IP addresses.
    #[must_use]
    pub fn ip_addresses(&self) -> &[String] {
        &self.data.ip_addresses
    }

    /// Deployed OS.
    #[must_use]
    pub fn os_system(&self) -> &str {
        &self.data.osystem
    }

    /// Deployed release.
    #[must_use]
    pub fn distro_series(&self) -> &str {
        &self.data.distro_series
    }

    /// Swap size in bytes.
    #[must_use]
    pub fn swap_size(&self) -> Option<i64> {
        self.data.swap_size
    }

    /// Deployment mode recorded by the service.
    #[must_use]
    pub fn deploy_mode(&self) -> DeployMode {
        DeployMode::from_ephemeral(self.data.ephemeral_deploy)
    }

    /// Tags.
    #[must_use]
    pub fn tag_names(&self) -> &[String] {
        &self.data.tag_names
    }

    /// Architecture.
    #[must_use]
    pub fn architecture(&self) -> &str {
        &self.data.architecture
    }

    /// CPU count.
    #[must_use]
    pub fn cpu_count(&self) -> u32 {
        self.data.cpu_count
    }

    /// Memory in MiB.
    #[must_use]
    pub fn memory(&self) -> u64 {
        self.data.memory
    }

    /// Fetch a fresh snapshot of this machine.
    ///
    /// This is how callers observe asynchronous transitions such as
    /// `Deploying` to `Deployed`.
    pub async fn get(&self) -> Result<Machine> {
        let request = ApiRequest::new(Operation::GetMachine, machine_path(self.system_id()));
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }

    /// Start commissioning.
    pub async fn commission(&self) -> Result<Machine> {
        info!(system_id = %self.system_id(), "commissioning machine");
        let request =
            ApiRequest::new(Operation::CommissionMachine, machine_path(self.system_id()));
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }

    /// Start a field update.
    #[must_use]
    pub fn modifier(&self) -> Modifier {
        Modifier::new(self.transport.clone(), self.system_id().clone())
    }

    /// Start a deployment request.
    #[must_use]
    pub fn deployer(&self) -> Deployer {
        Deployer::new(self.transport.clone(), self.system_id().clone())
    }

    /// Start a release request.
    #[must_use]
    pub fn releaser(&self) -> Releaser {
        Releaser::new(self.transport.clone(), self.system_id().clone())
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine").field("data", &self.data).finish()
    }
}

/// Builder for `POST machines/?op=allocate`.
#[must_use = "an allocator does nothing until `allocate` is awaited"]
pub struct Allocator {
    transport: Arc<dyn Transport>,
    system_id: Option<SystemId>,
    name: Option<String>,
    zone: Option<String>,
    pool: Option<String>,
    tags: Vec<String>,
    architecture: Option<String>,
    min_cpu_count: Option<u32>,
    min_memory: Option<u64>,
    comment: Option<String>,
}

impl Allocator {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            system_id: None,
            name: None,
            zone: None,
            pool: None,
            tags: Vec::new(),
            architecture: None,
            min_cpu_count: None,
            min_memory: None,
            comment: None,
        }
    }

    /// Request this specific machine.
    pub fn with_system_id(mut self, system_id: SystemId) -> Self {
        self.system_id = Some(system_id);
        self
    }

    /// Request a machine by hostname.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict to an availability zone.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Restrict to a resource pool.
    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Require all of these tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Require an architecture (e.g. `amd64/generic`).
    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    /// Require at least this many CPUs.
    pub fn with_min_cpu_count(mut self, count: u32) -> Self {
        self.min_cpu_count = Some(count);
        self
    }

    /// Require at least this much memory, in MiB.
    pub fn with_min_memory(mut self, mebibytes: u64) -> Self {
        self.min_memory = Some(mebibytes);
        self
    }

    /// Attach a comment to the allocation event.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("system_id", self.system_id.as_ref());
        form.push_opt("name", self.name.as_deref());
        form.push_opt("zone", self.zone.as_deref());
        form.push_opt("pool", self.pool.as_deref());
        form.push_each("tags", &self.tags);
        form.push_opt("arch", self.architecture.as_deref());
        form.push_opt("cpu_count", self.min_cpu_count);
        form.push_opt("mem", self.min_memory);
        form.push_opt("comment", self.comment.as_deref());
        form
    }

    /// Allocate a machine.
    ///
    /// # Errors
    ///
    /// [`Error::NoEligibleMachine`] when nothing matches the constraints,
    /// [`Error::InvalidConstraint`] when a constraint is rejected. No machine
    /// is allocated in either case.
    pub async fn allocate(self) -> Result<Machine> {
        debug!(zone = ?self.zone, system_id = ?self.system_id, "allocating machine");
        let request =
            ApiRequest::new(Operation::AllocateMachine, "machines/").with_form(self.form());
        let value = self.transport.send(request).await?;
        let machine = decode_machine(&self.transport, value)?;
        info!(system_id = %machine.system_id(), zone = machine.zone().name(), "allocated machine");
        Ok(machine)
    }
}

/// Builder for `PUT machines/{system_id}/`.
#[must_use = "a modifier does nothing until `update` is awaited"]
pub struct Modifier {
    transport: Arc<dyn Transport>,
    system_id: SystemId,
    swap_size: Option<i64>,
    hostname: Option<String>,
    description: Option<String>,
    min_hwe_kernel: Option<String>,
}

impl Modifier {
    fn new(transport: Arc<dyn Transport>, system_id: SystemId) -> Self {
        Self {
            transport,
            system_id,
            swap_size: None,
            hostname: None,
            description: None,
            min_hwe_kernel: None,
        }
    }

    /// Set swap size in bytes. Validity is checked by the service.
    pub fn set_swap_size(mut self, bytes: i64) -> Self {
        self.swap_size = Some(bytes);
        self
    }

    /// Rename the machine.
    pub fn set_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Replace the description.
    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the minimum kernel used for deployment.
    pub fn set_min_hwe_kernel(mut self, kernel: impl Into<String>) -> Self {
        self.min_hwe_kernel = Some(kernel.into());
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("swap_size", self.swap_size);
        form.push_opt("hostname", self.hostname.as_deref());
        form.push_opt("description", self.description.as_deref());
        form.push_opt("min_hwe_kernel", self.min_hwe_kernel.as_deref());
        form
    }

    /// Apply the changes and return the updated snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] when the service rejects a value.
    pub async fn update(self) -> Result<Machine> {
        debug!(system_id = %self.system_id, "updating machine");
        let request = ApiRequest::new(Operation::UpdateMachine, machine_path(&self.system_id))
            .with_form(self.form());
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }
}

/// Builder for `POST machines/{system_id}/?op=deploy`.
#[must_use = "a deployer does nothing until `deploy` is awaited"]
pub struct Deployer {
    transport: Arc<dyn Transport>,
    system_id: SystemId,
    os_system: Option<String>,
    distro_series: Option<String>,
    ephemeral_deploy: Option<bool>,
    hwe_kernel: Option<String>,
    user_data: Option<String>,
    install_kvm: Option<bool>,
}

impl Deployer {
    fn new(transport: Arc<dyn Transport>, system_id: SystemId) -> Self {
        Self {
            transport,
            system_id,
            os_system: None,
            distro_series: None,
            ephemeral_deploy: None,
            hwe_kernel: None,
            user_data: None,
            install_kvm: None,
        }
    }

    /// OS to install (e.g. `ubuntu`, `custom`).
    pub fn set_os_system(mut self, os_system: impl Into<String>) -> Self {
        self.os_system = Some(os_system.into());
        self
    }

    /// Release to install. There is no default; the service picks one when unset.
    pub fn set_distro_series(mut self, distro_series: impl Into<String>) -> Self {
        self.distro_series = Some(distro_series.into());
        self
    }

    /// Run the OS from memory instead of installing it to disk.
    pub fn set_ephemeral_deploy(mut self, ephemeral: bool) -> Self {
        self.ephemeral_deploy = Some(ephemeral);
        self
    }

    /// Same as [`Deployer::set_ephemeral_deploy`], expressed as a mode.
    pub fn set_deploy_mode(self, mode: DeployMode) -> Self {
        self.set_ephemeral_deploy(mode.is_ephemeral())
    }

    /// Kernel to boot.
    pub fn set_hwe_kernel(mut self, kernel: impl Into<String>) -> Self {
        self.hwe_kernel = Some(kernel.into());
        self
    }

    /// Base64-encoded cloud-init user data.
    pub fn set_user_data(mut self, user_data_b64: impl Into<String>) -> Self {
        self.user_data = Some(user_data_b64.into());
        self
    }

    /// Install a KVM host after deployment.
    pub fn set_install_kvm(mut self, install: bool) -> Self {
        self.install_kvm = Some(install);
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("osystem", self.os_system.as_deref());
        form.push_opt("distro_series", self.distro_series.as_deref());
        form.push_flag("ephemeral_deploy", self.ephemeral_deploy);
        form.push_opt("hwe_kernel", self.hwe_kernel.as_deref());
        form.push_opt("user_data", self.user_data.as_deref());
        form.push_flag("install_kvm", self.install_kvm);
        form
    }

    /// Request deployment.
    ///
    /// Returns once the service has accepted the request; the snapshot is
    /// usually `Deploying`. Poll [`Machine::get`] to observe `Deployed`.
    pub async fn deploy(self) -> Result<Machine> {
        let mode = DeployMode::from_ephemeral(self.ephemeral_deploy.unwrap_or(false));
        info!(
            system_id = %self.system_id,
            osystem = ?self.os_system,
            distro_series = ?self.distro_series,
            mode = mode.as_str(),
            "deploying machine"
        );
        let request = ApiRequest::new(Operation::DeployMachine, machine_path(&self.system_id))
            .with_form(self.form());
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }
}

/// Builder for `POST machines/{system_id}/?op=release`.
#[must_use = "a releaser does nothing until `release` is awaited"]
pub struct Releaser {
    transport: Arc<dyn Transport>,
    system_id: SystemId,
    comment: Option<String>,
    erase: Option<bool>,
    secure_erase: Option<bool>,
    quick_erase: Option<bool>,
    force: Option<bool>,
}

impl Releaser {
    fn new(transport: Arc<dyn Transport>, system_id: SystemId) -> Self {
        Self {
            transport,
            system_id,
            comment: None,
            erase: None,
            secure_erase: None,
            quick_erase: None,
            force: None,
        }
    }

    /// Attach a comment to the release event.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Erase disks before returning the machine to the pool.
    pub fn with_erase(mut self, erase: bool) -> Self {
        self.erase = Some(erase);
        self
    }

    /// Use the drive's secure erase when erasing.
    pub fn with_secure_erase(mut self, secure: bool) -> Self {
        self.secure_erase = Some(secure);
        self
    }

    /// Only wipe the start and end of each disk when erasing.
    pub fn with_quick_erase(mut self, quick: bool) -> Self {
        self.quick_erase = Some(quick);
        self
    }

    /// Release even if the machine is in a state that normally forbids it.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    fn form(&self) -> Params {
        let mut form = Params::new();
        form.push_opt("comment", self.comment.as_deref());
        form.push_flag("erase", self.erase);
        form.push_flag("secure_erase", self.secure_erase);
        form.push_flag("quick_erase", self.quick_erase);
        form.push_flag("force", self.force);
        form
    }

    /// Release the machine.
    ///
    /// # Errors
    ///
    /// Releasing a machine that is already released fails on the service side
    /// and is returned as-is.
    pub async fn release(self) -> Result<Machine> {
        info!(system_id = %self.system_id, "releasing machine");
        let request = ApiRequest::new(Operation::ReleaseMachine, machine_path(&self.system_id))
            .with_form(self.form());
        let value = self.transport.send(request).await?;
        decode_machine(&self.transport, value)
    }
}
