//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::{Error, Result};

/// Process identifier, host-visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ProcessId(i32);

impl ProcessId {
    /// Create from raw PID
    #[must_use]
    pub const fn from_raw(pid: i32) -> Self {
        Self(pid)
    }

    /// Get the current process ID
    #[must_use]
    pub fn current() -> Self {
        #[allow(clippy::cast_possible_wrap)]
        Self(std::process::id() as i32)
    }

    /// Convert to `nix::unistd::Pid`
    #[must_use]
    pub const fn as_nix_pid(self) -> nix::unistd::Pid {
        nix::unistd::Pid::from_raw(self.0)
    }

    /// Get raw PID value
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<nix::unistd::Pid> for ProcessId {
    fn from(pid: nix::unistd::Pid) -> Self {
        Self(pid.as_raw())
    }
}

impl From<ProcessId> for nix::unistd::Pid {
    fn from(pid: ProcessId) -> Self {
        nix::unistd::Pid::from_raw(pid.0)
    }
}

/// Network interface name with validation
///
/// The kernel limits interface names to 15 bytes (IFNAMSIZ minus the NUL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct LinkName(String);

impl LinkName {
    /// Maximum length for interface names
    pub const MAX_LENGTH: usize = 15;

    /// Create a new `LinkName` with validation
    ///
    /// # Errors
    /// Returns error if the name is empty, longer than 15 bytes, or
    /// contains characters the kernel rejects.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::config("link name cannot be empty"));
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(Error::config(format!(
                "link name too long (max {} bytes)",
                Self::MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(Error::config(
                "link name can only contain alphanumeric, dash, underscore, and dot",
            ));
        }

        Ok(())
    }

    /// Get the link name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LinkName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for LinkName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<LinkName> for String {
    fn from(name: LinkName) -> Self {
        name.0
    }
}

/// Network wiring configuration for a single container launch
///
/// The original fixed names live here as defaults. One launch at a time is
/// assumed: the veth endpoint names are derived deterministically from the
/// prefix, with no uniqueness suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Pre-existing bridge device on the host
    pub bridge: LinkName,

    /// Host-side veth endpoint, attached to the bridge
    pub host_link: LinkName,

    /// Container-side veth endpoint, moved into the container's namespace
    pub container_link: LinkName,

    /// Address assigned to the container-side endpoint
    pub address: Ipv4Addr,

    /// Subnet prefix length for the container address
    pub prefix_len: u8,

    /// Default gateway installed inside the container
    pub gateway: Ipv4Addr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bridge: LinkName(String::from("br0")),
            host_link: LinkName(String::from("vm0")),
            container_link: LinkName(String::from("vm1")),
            address: Ipv4Addr::new(10, 10, 10, 2),
            prefix_len: 24,
            gateway: Ipv4Addr::new(10, 10, 10, 1),
        }
    }
}

impl NetworkConfig {
    /// Derive both veth endpoint names from a common prefix
    /// (`<prefix>0` on the host, `<prefix>1` in the container)
    ///
    /// # Errors
    /// Returns error if a derived name fails `LinkName` validation.
    pub fn with_link_prefix(mut self, prefix: &str) -> Result<Self> {
        self.host_link = LinkName::new(format!("{prefix}0"))?;
        self.container_link = LinkName::new(format!("{prefix}1"))?;
        Ok(self)
    }

    /// Validate the configuration as a whole
    ///
    /// # Errors
    /// Returns error if the prefix length is out of range or the two veth
    /// endpoints collide.
    pub fn validate(&self) -> Result<()> {
        if self.prefix_len == 0 || self.prefix_len > 32 {
            return Err(Error::config(format!(
                "prefix length {} out of range (1-32)",
                self.prefix_len
            )));
        }

        if self.host_link == self.container_link {
            return Err(Error::config(format!(
                "host and container links share the name {}",
                self.host_link
            )));
        }

        Ok(())
    }
}
