//! Stage one of the launch: clone the isolated child and wire its network
//!
//! The wiring runs as a detached-but-joined task racing the child's own
//! startup; its outcome reaches the child over the readiness pipe and
//! never changes this process's exit code.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use burrow_core::{LinkName, NetworkConfig};
use burrow_namespace::{IsolationRequest, Launcher, WiringStatus};
use burrow_net::BridgeWirer;

use crate::cli::RunArgs;

pub async fn execute(args: RunArgs) -> Result<i32> {
    let network = NetworkConfig {
        bridge: LinkName::new(args.bridge).context("invalid bridge name")?,
        address: args.address,
        prefix_len: args.prefix_len,
        gateway: args.gateway,
        ..NetworkConfig::default()
    }
    .with_link_prefix(&args.link_prefix)
    .context("invalid link prefix")?;

    let mut request = IsolationRequest::new(args.rootfs);
    request.hostname = args.hostname;
    request.network = network.clone();

    info!(
        rootfs = %request.rootfs.display(),
        bridge = %network.bridge,
        "starting isolated process"
    );

    let launcher = Launcher::new(request);
    let child = Arc::new(
        launcher
            .launch()
            .context("failed to launch isolated process")?,
    );
    info!(pid = %child.pid(), "child running");

    // Host-side wiring, concurrent with the child's own startup. Its
    // outcome is signaled to the child; a failure here leaves the
    // container without a link but does not abort it.
    let wirer = BridgeWirer::new(network);
    let wiring_child = Arc::clone(&child);
    let wiring = tokio::spawn(async move {
        let status = match wirer.wire(wiring_child.pid()).await {
            Ok(()) => WiringStatus::Wired,
            Err(e) => {
                warn!(error = %e, "bridge wiring failed");
                WiringStatus::Failed
            }
        };
        if let Err(e) = wiring_child.notify_wiring(status) {
            warn!(error = %e, "could not signal wiring status to child");
        }
        status
    });

    let wait_child = Arc::clone(&child);
    let exit_code = tokio::task::spawn_blocking(move || wait_child.wait())
        .await
        .context("wait task failed")?
        .context("failed waiting on isolated process")?;

    // Join the wiring task before exiting so its outcome is never
    // silently dropped
    match wiring.await {
        Ok(WiringStatus::Wired) => {}
        Ok(WiringStatus::Failed) => warn!("container ran without bridge wiring"),
        Err(e) => warn!(error = %e, "wiring task did not complete"),
    }

    if exit_code == 0 {
        info!("container exited cleanly");
    } else {
        warn!(exit_code, "container exited with failure");
    }

    Ok(exit_code)
}
