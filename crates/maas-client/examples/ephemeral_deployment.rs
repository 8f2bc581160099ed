//! Allocate a machine, deploy it into memory, wait for it and release it.
//!
//! ```text
//! MAAS_ENDPOINT=http://maas:5240/MAAS MAAS_API_KEY=ck:tk:ts \
//!     cargo run --example ephemeral_deployment -- az1 jammy
//! ```

use anyhow::{bail, Context, Result};
use maas_client::{ClientSet, MachineStatus};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const POLL_INTERVAL: Duration = Duration::from_secs(15);
const MAX_POLLS: usize = 80;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut args = std::env::args().skip(1);
    let zone = args.next().unwrap_or_else(|| "default".to_string());
    let series = args.next().unwrap_or_else(|| "jammy".to_string());

    let client = ClientSet::from_env().context("MAAS_ENDPOINT and MAAS_API_KEY must be set")?;

    let machine = client
        .machines()
        .allocator()
        .with_zone(&zone)
        .with_comment("ephemeral deployment example")
        .allocate()
        .await
        .context("allocation failed")?;
    info!(system_id = %machine.system_id(), hostname = machine.hostname(), "allocated");

    let machine = machine.modifier().set_swap_size(0).update().await?;

    let mut machine = machine
        .deployer()
        .set_os_system("ubuntu")
        .set_distro_series(&series)
        .set_ephemeral_deploy(true)
        .deploy()
        .await?;
    info!(status = %machine.status(), "deployment accepted");

    for _ in 0..MAX_POLLS {
        if !machine.status().is_transitional() {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        machine = machine.get().await?;
    }

    let outcome = machine.status().clone();
    info!(status = %outcome, ips = ?machine.ip_addresses(), "deployment finished");

    machine
        .releaser()
        .with_comment("Example cleanup")
        .release()
        .await?;

    if outcome != MachineStatus::Deployed {
        bail!("machine ended in {outcome}");
    }
    Ok(())
}
