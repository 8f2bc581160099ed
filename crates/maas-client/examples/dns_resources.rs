//! Create, update and remove a DNS resource.
//!
//! ```text
//! MAAS_ENDPOINT=http://maas:5240/MAAS MAAS_API_KEY=ck:tk:ts \
//!     cargo run --example dns_resources -- example-host.maas
//! ```

use anyhow::{Context, Result};
use maas_client::{ClientSet, DnsResourceListParams};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let fqdn = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "example-host.maas".to_string());

    let client = ClientSet::from_env().context("MAAS_ENDPOINT and MAAS_API_KEY must be set")?;
    let dns = client.dns_resources();

    for resource in dns.list(None).await? {
        info!(
            id = %resource.id(),
            fqdn = resource.fqdn(),
            ips = ?resource.ip_addresses(),
            "existing"
        );
    }

    let filters = DnsResourceListParams::new().with_fqdn(&fqdn);
    if let Some(existing) = dns.list(Some(&filters)).await?.into_iter().next() {
        info!(id = %existing.id(), "removing stale resource");
        existing.delete().await?;
    }

    let created = dns
        .builder()
        .with_fqdn(&fqdn)
        .with_address_ttl(60)
        .with_ip_addresses(["192.0.2.10"])
        .create()
        .await?;
    info!(id = %created.id(), "created");

    let updated = created
        .modifier()
        .set_ip_addresses(["192.0.2.10", "192.0.2.11"])
        .modify()
        .await?;
    info!(ips = ?updated.ip_addresses(), "updated");

    updated.delete().await?;
    info!("deleted");
    Ok(())
}
