//! Namespace inspection via `/proc`
//!
//! Reads the `/proc/<pid>/ns` symlinks for the six namespace kinds this
//! runtime creates. Works unprivileged for the caller's own processes.

use std::fmt;
use std::fs;

use burrow_core::{Error, ProcessId, Result};

/// Namespace identities of one process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceReport {
    /// Mount namespace ID
    pub mnt: Option<String>,
    /// PID namespace ID
    pub pid: Option<String>,
    /// Network namespace ID
    pub net: Option<String>,
    /// UTS namespace ID
    pub uts: Option<String>,
    /// IPC namespace ID
    pub ipc: Option<String>,
    /// User namespace ID
    pub user: Option<String>,
}

impl NamespaceReport {
    /// Read the namespace identities of a process
    pub fn for_pid(pid: ProcessId) -> Result<Self> {
        let base = format!("/proc/{pid}/ns");

        if !std::path::Path::new(&base).exists() {
            return Err(Error::Child {
                message: format!("no such process: {pid}"),
            });
        }

        let read_ns = |name: &str| -> Option<String> {
            fs::read_link(format!("{base}/{name}"))
                .map(|p| p.to_string_lossy().into_owned())
                .ok()
        };

        Ok(Self {
            mnt: read_ns("mnt"),
            pid: read_ns("pid"),
            net: read_ns("net"),
            uts: read_ns("uts"),
            ipc: read_ns("ipc"),
            user: read_ns("user"),
        })
    }

    /// Read the namespace identities of the current process
    pub fn current() -> Result<Self> {
        Self::for_pid(ProcessId::current())
    }

    /// Check whether this process sits in different namespaces than init
    ///
    /// Compares the mount, PID, and network identities against PID 1.
    pub fn is_isolated_from_init(&self) -> Result<bool> {
        let init = Self::for_pid(ProcessId::from_raw(1))?;

        Ok(self.mnt != init.mnt || self.pid != init.pid || self.net != init.net)
    }
}

impl fmt::Display for NamespaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("mnt", &self.mnt),
            ("pid", &self.pid),
            ("net", &self.net),
            ("uts", &self.uts),
            ("ipc", &self.ipc),
            ("user", &self.user),
        ];

        for (label, id) in rows {
            if let Some(id) = id {
                writeln!(f, "  {label:<5} {id}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_report() {
        let report = NamespaceReport::current().unwrap();

        assert!(report.mnt.is_some());
        assert!(report.pid.is_some());
        assert!(report.net.is_some());
    }

    #[test]
    fn test_missing_process_errors() {
        // PID 0 never has a proc entry
        assert!(NamespaceReport::for_pid(ProcessId::from_raw(0)).is_err());
    }

    #[test]
    fn test_display_labels() {
        let report = NamespaceReport {
            pid: Some("pid:[4026531836]".to_string()),
            net: Some("net:[4026531905]".to_string()),
            ..Default::default()
        };

        let rendered = format!("{report}");
        assert!(rendered.contains("pid:[4026531836]"));
        assert!(rendered.contains("net:[4026531905]"));
        assert!(!rendered.contains("mnt"));
    }
}
