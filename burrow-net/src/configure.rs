//! In-namespace address, link, and route configuration
//!
//! Runs inside the container's network namespace, strictly after the
//! host side has moved the container link in. Does not wait and does not
//! retry: the visibility barrier is the caller's job, and a missing link
//! here is fatal to container startup before anything is applied.

use std::net::IpAddr;

use tracing::{debug, info};

use burrow_core::{Error, NetworkConfig, Result};

use crate::link::{expect_link, find_link};

/// Configures the container end of the virtual link
#[derive(Debug, Clone)]
pub struct NetworkConfigurator {
    config: NetworkConfig,
}

impl NetworkConfigurator {
    /// Create a configurator for the given network configuration
    #[must_use]
    pub const fn new(config: NetworkConfig) -> Self {
        Self { config }
    }

    /// Assign the address, activate the link, and install the default
    /// route via the configured gateway
    ///
    /// # Errors
    /// Returns a "link not found" error if the container end is not
    /// visible in this namespace; nothing is partially applied in that
    /// case. Netlink failures on the individual steps are reported with
    /// the failing operation's name.
    pub async fn configure(&self) -> Result<()> {
        let (connection, handle, _) =
            rtnetlink::new_connection().map_err(|e| Error::network("netlink connect", e))?;
        tokio::spawn(connection);

        // Loopback first; a fresh namespace starts with everything down
        if let Some(lo) = find_link(&handle, "lo").await? {
            handle
                .link()
                .set(lo.header.index)
                .up()
                .execute()
                .await
                .map_err(|e| Error::network("loopback up", e))?;
        }

        let link = expect_link(&handle, self.config.container_link.as_str()).await?;
        let index = link.header.index;
        debug!(link = %self.config.container_link, index, "container link located");

        handle
            .address()
            .add(
                index,
                IpAddr::V4(self.config.address),
                self.config.prefix_len,
            )
            .execute()
            .await
            .map_err(|e| Error::network("address assign", e))?;

        handle
            .link()
            .set(index)
            .up()
            .execute()
            .await
            .map_err(|e| Error::network("link up", e))?;

        handle
            .route()
            .add()
            .v4()
            .gateway(self.config.gateway)
            .execute()
            .await
            .map_err(|e| Error::network("default route", e))?;

        info!(
            link = %self.config.container_link,
            address = %self.config.address,
            prefix = self.config.prefix_len,
            gateway = %self.config.gateway,
            "container network configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configurator_carries_the_binding() {
        let configurator = NetworkConfigurator::new(NetworkConfig::default());

        assert_eq!(configurator.config.address.to_string(), "10.10.10.2");
        assert_eq!(configurator.config.prefix_len, 24);
        assert_eq!(configurator.config.gateway.to_string(), "10.10.10.1");
    }

    #[tokio::test]
    #[ignore] // Requires an unshared network namespace (root)
    async fn test_missing_link_fails_without_partial_application() {
        // In a namespace without vm1 the lookup must fail with the
        // device-not-found class before any address or route is applied
        let configurator = NetworkConfigurator::new(NetworkConfig::default());
        let err = configurator.configure().await.unwrap_err();
        assert!(matches!(err, Error::LinkNotFound { .. }));
    }
}
