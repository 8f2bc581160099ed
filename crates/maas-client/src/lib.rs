//! MAAS client for machines and DNS resources.
//!
//! Operations are fluent builders that end in a single request:
//!
//! ```no_run
//! # async fn run() -> maas_client::Result<()> {
//! use maas_client::ClientSet;
//!
//! let client = ClientSet::from_env()?;
//! let machine = client.machines().allocator().with_zone("az1").allocate().await?;
//! let machine = machine
//!     .deployer()
//!     .set_os_system("ubuntu")
//!     .set_distro_series("jammy")
//!     .set_ephemeral_deploy(true)
//!     .deploy()
//!     .await?;
//! machine.releaser().with_comment("done").release().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod dns;
pub mod machine;
pub mod models;
pub mod transport;

pub use client::{ClientSet, ClientSetBuilder};
pub use dns::{DnsResource, DnsResourceBuilder, DnsResourceModifier, DnsResources};
pub use machine::{Allocator, Deployer, Machine, Machines, Modifier, Releaser};
pub use models::{
    DeployMode, DnsIpAddress, DnsResourceData, DnsResourceListParams, MachineData,
    MachineListParams, MachineStatus, PowerState, ResourcePool, Zone, FQDN_KEY,
};
pub use transport::{ApiRequest, HttpTransport, Operation, Transport};

pub use maas_core::id::{DnsResourceId, SystemId};
pub use maas_core::Error;

/// Convenient result alias that reuses the shared MAAS error type.
pub type Result<T> = maas_core::Result<T>;
