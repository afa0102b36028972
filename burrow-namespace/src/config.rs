//! Namespace and identity-mapping configuration

use nix::sched::CloneFlags;
use serde::{Deserialize, Serialize};

/// Namespace kinds to create at clone time
///
/// Unlike `unshare(2)`-based approaches, every enabled kind here takes
/// effect atomically when the child is cloned, including PID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Enable mount namespace
    pub mount: bool,

    /// Enable PID namespace
    pub pid: bool,

    /// Enable network namespace
    pub network: bool,

    /// Enable UTS namespace (hostname)
    pub uts: bool,

    /// Enable IPC namespace
    pub ipc: bool,

    /// Enable user namespace
    pub user: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            mount: true,
            pid: true,
            network: true,
            uts: true,
            ipc: true,
            user: true,
        }
    }
}

impl NamespaceConfig {
    /// Create a new namespace configuration with all kinds enabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable mount namespace
    #[must_use]
    pub const fn with_mount(mut self, enable: bool) -> Self {
        self.mount = enable;
        self
    }

    /// Enable PID namespace
    #[must_use]
    pub const fn with_pid(mut self, enable: bool) -> Self {
        self.pid = enable;
        self
    }

    /// Enable network namespace
    #[must_use]
    pub const fn with_network(mut self, enable: bool) -> Self {
        self.network = enable;
        self
    }

    /// Enable UTS namespace
    #[must_use]
    pub const fn with_uts(mut self, enable: bool) -> Self {
        self.uts = enable;
        self
    }

    /// Enable IPC namespace
    #[must_use]
    pub const fn with_ipc(mut self, enable: bool) -> Self {
        self.ipc = enable;
        self
    }

    /// Enable user namespace
    #[must_use]
    pub const fn with_user(mut self, enable: bool) -> Self {
        self.user = enable;
        self
    }

    /// Convert to clone flags for `clone(2)`
    #[must_use]
    pub fn to_clone_flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();

        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.ipc {
            flags |= CloneFlags::CLONE_NEWIPC;
        }
        if self.user {
            flags |= CloneFlags::CLONE_NEWUSER;
        }

        flags
    }

    /// Check if any namespaces are enabled
    #[must_use]
    pub const fn has_any(&self) -> bool {
        self.mount || self.pid || self.network || self.uts || self.ipc || self.user
    }

    /// Get list of enabled namespace names
    #[must_use]
    pub fn enabled_namespaces(&self) -> Vec<&'static str> {
        let mut namespaces = Vec::new();

        if self.mount {
            namespaces.push("mnt");
        }
        if self.pid {
            namespaces.push("pid");
        }
        if self.network {
            namespaces.push("net");
        }
        if self.uts {
            namespaces.push("uts");
        }
        if self.ipc {
            namespaces.push("ipc");
        }
        if self.user {
            namespaces.push("user");
        }

        namespaces
    }
}

/// A single UID or GID mapping for the user namespace
///
/// Written to `/proc/<pid>/uid_map` or `gid_map` as one `inside outside
/// count` line. The default launch maps container id 0 to the invoking
/// user's id with size 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    /// First id inside the namespace
    pub container_id: u32,

    /// First id outside the namespace
    pub host_id: u32,

    /// Number of consecutive ids mapped
    pub size: u32,
}

impl IdMapping {
    /// Create a new mapping
    #[must_use]
    pub const fn new(container_id: u32, host_id: u32, size: u32) -> Self {
        Self {
            container_id,
            host_id,
            size,
        }
    }

    /// Map container root to the invoking user's UID
    #[must_use]
    pub fn current_user() -> Self {
        Self::new(0, nix::unistd::getuid().as_raw(), 1)
    }

    /// Map container root's group to the invoking user's GID
    #[must_use]
    pub fn current_group() -> Self {
        Self::new(0, nix::unistd::getgid().as_raw(), 1)
    }

    /// Render as a proc map-file line
    #[must_use]
    pub fn as_line(&self) -> String {
        format!("{} {} {}\n", self.container_id, self.host_id, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_all_six() {
        let config = NamespaceConfig::default();
        assert!(config.has_any());
        assert_eq!(
            config.enabled_namespaces(),
            vec!["mnt", "pid", "net", "uts", "ipc", "user"]
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = NamespaceConfig::new().with_network(false).with_user(false);

        assert!(config.pid);
        assert!(!config.network);
        assert!(!config.user);
    }

    #[test]
    fn test_clone_flags_conversion() {
        let flags = NamespaceConfig::default().to_clone_flags();

        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWIPC));
        assert!(flags.contains(CloneFlags::CLONE_NEWUSER));

        let none = NamespaceConfig::new()
            .with_mount(false)
            .with_pid(false)
            .with_network(false)
            .with_uts(false)
            .with_ipc(false)
            .with_user(false);
        assert!(none.to_clone_flags().is_empty());
        assert!(!none.has_any());
    }

    #[test]
    fn test_id_mapping_line() {
        let mapping = IdMapping::new(0, 1000, 1);
        assert_eq!(mapping.as_line(), "0 1000 1\n");
    }

    #[test]
    fn test_current_mappings_target_container_root() {
        let uid = IdMapping::current_user();
        let gid = IdMapping::current_group();

        assert_eq!(uid.container_id, 0);
        assert_eq!(gid.container_id, 0);
        assert_eq!(uid.size, 1);
        assert_eq!(gid.size, 1);
    }
}
