//! Host-side bridge wiring
//!
//! Runs outside the container's namespaces, concurrently with the child's
//! own startup. Creates the veth pair as one kernel object, attaches the
//! host end to the pre-existing bridge, and moves the peer into the
//! target process's network namespace. The move is a one-way ownership
//! transfer: afterward the host can no longer see the peer by name.

use std::time::Duration;

use rtnetlink::Handle;
use tracing::{debug, warn};

use burrow_core::{Error, NetworkConfig, ProcessId, Result};

use crate::link::{expect_link, find_link, is_bridge};

/// Attempts for the namespace move; the target may still be mid-startup
/// on the first try
const REPARENT_ATTEMPTS: u32 = 3;

/// Initial backoff between reparent attempts, doubled each retry
const REPARENT_BACKOFF: Duration = Duration::from_millis(150);

/// Wires one container to the host bridge
#[derive(Debug, Clone)]
pub struct BridgeWirer {
    config: NetworkConfig,
}

impl BridgeWirer {
    /// Create a wirer for the given network configuration
    #[must_use]
    pub const fn new(config: NetworkConfig) -> Self {
        Self { config }
    }

    /// Wire the process `target` to the configured bridge
    ///
    /// Order matters: the host end is attached to the bridge before it is
    /// activated, otherwise forwarding behavior is undefined. If any step
    /// after pair creation fails, the pair is deleted again so no
    /// orphaned devices accumulate on the host. A target that has already
    /// exited surfaces as a normal error.
    pub async fn wire(&self, target: ProcessId) -> Result<()> {
        let (connection, handle, _) =
            rtnetlink::new_connection().map_err(|e| Error::network("netlink connect", e))?;
        tokio::spawn(connection);

        debug!(
            host = %self.config.host_link,
            peer = %self.config.container_link,
            "creating veth pair"
        );
        handle
            .link()
            .add()
            .veth(
                self.config.host_link.as_str().to_string(),
                self.config.container_link.as_str().to_string(),
            )
            .execute()
            .await
            .map_err(|e| Error::network("veth create", e))?;

        match self.attach_and_reparent(&handle, target).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Compensating delete; one failed launch must not leak
                // virtual devices
                if let Err(cleanup) = self.delete_pair(&handle).await {
                    warn!(error = %cleanup, "veth rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn attach_and_reparent(&self, handle: &Handle, target: ProcessId) -> Result<()> {
        let bridge_name = self.config.bridge.as_str();
        let bridge = find_link(handle, bridge_name)
            .await?
            .ok_or_else(|| Error::Bridge {
                name: bridge_name.to_string(),
                reason: "not found on the host",
            })?;

        if !is_bridge(&bridge) {
            return Err(Error::Bridge {
                name: bridge_name.to_string(),
                reason: "not a bridge device",
            });
        }

        let host = expect_link(handle, self.config.host_link.as_str()).await?;

        handle
            .link()
            .set(host.header.index)
            .controller(bridge.header.index)
            .execute()
            .await
            .map_err(|e| Error::network("bridge attach", e))?;
        debug!(bridge = %self.config.bridge, "host end attached");

        handle
            .link()
            .set(host.header.index)
            .up()
            .execute()
            .await
            .map_err(|e| Error::network("host link up", e))?;

        let peer = expect_link(handle, self.config.container_link.as_str()).await?;
        self.reparent(handle, peer.header.index, target).await
    }

    /// Move the peer into the target's network namespace, with bounded
    /// retry: the child exists from the moment clone returns, but a
    /// heavily loaded host can still race us here.
    async fn reparent(&self, handle: &Handle, peer_index: u32, target: ProcessId) -> Result<()> {
        #[allow(clippy::cast_sign_loss)]
        let target_pid = target.as_raw() as u32;
        let mut backoff = REPARENT_BACKOFF;

        for attempt in 1..=REPARENT_ATTEMPTS {
            match handle
                .link()
                .set(peer_index)
                .setns_by_pid(target_pid)
                .execute()
                .await
            {
                Ok(()) => {
                    debug!(peer = %self.config.container_link, pid = %target, "peer moved into namespace");
                    return Ok(());
                }
                Err(e) if attempt < REPARENT_ATTEMPTS => {
                    debug!(attempt, error = %e, "namespace move failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(Error::network("namespace move", e)),
            }
        }

        unreachable!("loop returns on success or final attempt")
    }

    async fn delete_pair(&self, handle: &Handle) -> Result<()> {
        // Deleting either end removes the pair; the host end is the one
        // guaranteed to still be in our namespace
        if let Some(host) = find_link(handle, self.config.host_link.as_str()).await? {
            handle
                .link()
                .del(host.header.index)
                .execute()
                .await
                .map_err(|e| Error::network("veth delete", e))?;
        }
        Ok(())
    }
}
