//! Bounded wait for namespace-visible network links
//!
//! A freshly created network namespace sees only loopback. The wait polls
//! until the expected container-side link has been moved in by the host,
//! or the bound expires. It is a synchronization barrier against the
//! host-side wiring, not a link-state probe: the link may still be down
//! when the wait returns.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use burrow_core::{Error, LinkName, Result};

/// Source of the interface names visible in the calling namespace
///
/// Injectable so the timeout behavior is testable without a namespace.
pub trait InterfaceLister {
    /// List visible interface names, in no particular order
    fn interfaces(&self) -> Result<Vec<String>>;
}

/// Lists interfaces from `/sys/class/net`
#[derive(Debug, Clone)]
pub struct SysfsLister {
    root: PathBuf,
}

impl SysfsLister {
    /// Lister over the standard sysfs mount
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/sys/class/net"),
        }
    }
}

impl Default for SysfsLister {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceLister for SysfsLister {
    fn interfaces(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// The bounded poll loop
#[derive(Debug, Clone)]
pub struct NetworkWait {
    /// Delay between polls
    pub poll_interval: Duration,

    /// Total bound on the wait
    pub timeout: Duration,
}

impl Default for NetworkWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

impl NetworkWait {
    /// Poll until `link` is visible through `lister`
    ///
    /// # Errors
    /// Returns a timeout error if the link never appears within the
    /// bound, or a lister error verbatim.
    pub async fn wait_for<L: InterfaceLister>(&self, lister: &L, link: &LinkName) -> Result<()> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            let names = lister.interfaces()?;
            if names.iter().any(|name| name == link.as_str()) {
                debug!(link = %link, "link visible in namespace");
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: format!("link {link}"),
                    limit: self.timeout,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
