//! Two-phase isolated-process launch
//!
//! Stage one runs on the host: `clone(2)` with the requested namespace
//! flags creates the child atomically inside its new namespaces, the
//! parent writes the identity maps, and only then is the child released
//! to re-execute this binary at the `init` entry point. Stage two (the
//! `init` subcommand) therefore runs as PID 1 of the new PID namespace
//! before any other code path can.
//!
//! This module uses `unsafe` for `clone(2)`, which is inherently unsafe
//! but required to apply PID-namespace flags at process-creation time.

#![allow(unsafe_code)]

use std::ffi::CString;
use std::fs;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::time::Duration;

use nix::errno::Errno;
use nix::sched::clone;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::execv;
use tracing::{debug, warn};

use burrow_core::{Error, NetworkConfig, ProcessId, Result};

use crate::config::{IdMapping, NamespaceConfig};
use crate::sync::{SyncPipe, WiringStatus};

/// Stack for the cloned child, before it execs
const STACK_SIZE: usize = 1024 * 1024;

/// Signal byte telling the cloned child its identity maps are in place
const MAPS_READY: u8 = 0;

/// Bound on the child's wait for the identity maps; a parent that dies
/// mid-launch must not leave the child blocked forever
const MAPS_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to launch one isolated process
///
/// Immutable once launch begins.
#[derive(Debug, Clone)]
pub struct IsolationRequest {
    /// Root filesystem the child pivots into
    pub rootfs: PathBuf,

    /// Namespace kinds created at clone time
    pub namespaces: NamespaceConfig,

    /// UID mapping for the user namespace
    pub uid_map: IdMapping,

    /// GID mapping for the user namespace
    pub gid_map: IdMapping,

    /// Hostname set inside the UTS namespace
    pub hostname: String,

    /// Network wiring parameters, forwarded to both sides of the launch
    pub network: NetworkConfig,
}

impl IsolationRequest {
    /// Create a request with the default namespace set, identity maps for
    /// the invoking user, and default network wiring
    #[must_use]
    pub fn new(rootfs: impl Into<PathBuf>) -> Self {
        Self {
            rootfs: rootfs.into(),
            namespaces: NamespaceConfig::default(),
            uid_map: IdMapping::current_user(),
            gid_map: IdMapping::current_group(),
            hostname: String::from("burrow"),
            network: NetworkConfig::default(),
        }
    }

    /// Validate the request before any process or kernel object is created
    ///
    /// A nonexistent root filesystem fails here, before clone and before
    /// any network wiring is attempted.
    pub fn validate(&self) -> Result<()> {
        if !self.rootfs.is_dir() {
            return Err(Error::config(format!(
                "root filesystem {} does not exist or is not a directory",
                self.rootfs.display()
            )));
        }

        if self.hostname.is_empty() {
            return Err(Error::config("hostname cannot be empty"));
        }

        self.network.validate()
    }
}

/// Launches one isolated process from an [`IsolationRequest`]
#[derive(Debug)]
pub struct Launcher {
    request: IsolationRequest,
}

impl Launcher {
    /// Create a new launcher
    #[must_use]
    pub const fn new(request: IsolationRequest) -> Self {
        Self { request }
    }

    /// Get the request
    #[must_use]
    pub const fn request(&self) -> &IsolationRequest {
        &self.request
    }

    /// Clone the isolated child and release it into stage two
    ///
    /// On return the child is executing (or about to execute) the `init`
    /// entry point inside its new namespaces. The caller is expected to
    /// run the bridge wiring concurrently, report its outcome through
    /// [`IsolatedChild::notify_wiring`], and then [`IsolatedChild::wait`].
    pub fn launch(&self) -> Result<IsolatedChild> {
        self.request.validate()?;

        let maps_pipe = SyncPipe::new()?;
        let ready_pipe = SyncPipe::new()?;
        // The read end must survive the child's execv
        ready_pipe.keep_reader_across_exec()?;

        // argv is prepared before clone; the child callback must not
        // allocate between clone and exec
        let argv = self.init_argv(ready_pipe.reader_fd())?;

        let mut stack = vec![0u8; STACK_SIZE];
        let flags = self.request.namespaces.to_clone_flags();
        debug!(
            namespaces = ?self.request.namespaces.enabled_namespaces(),
            "cloning isolated child"
        );

        let child_entry = Box::new(|| -> isize {
            // Released by the parent once the identity maps are written
            if maps_pipe.wait(MAPS_TIMEOUT, "identity maps").is_err() {
                return 126;
            }

            match execv(&argv[0], &argv) {
                Ok(infallible) => match infallible {},
                Err(_) => 127,
            }
        });

        let pid = unsafe {
            clone(
                child_entry,
                &mut stack,
                flags,
                Some(Signal::SIGCHLD as i32),
            )
        }
        .map_err(|e| Error::setup("clone", e))?;

        let pid = ProcessId::from(pid);
        debug!(pid = %pid, "child cloned");

        if self.request.namespaces.user {
            if let Err(err) = write_id_maps(pid, self.request.uid_map, self.request.gid_map) {
                // The child is still parked on the maps pipe; do not
                // leave it there
                abort_child(pid);
                return Err(err);
            }
        }

        if let Err(err) = maps_pipe.signal(MAPS_READY) {
            abort_child(pid);
            return Err(err);
        }

        Ok(IsolatedChild {
            pid,
            ready: ready_pipe,
        })
    }

    fn init_argv(&self, ready_fd: RawFd) -> Result<Vec<CString>> {
        let net = &self.request.network;

        Ok(vec![
            cstr("/proc/self/exe")?,
            cstr("init")?,
            cstr("--rootfs")?,
            cstr(self.request.rootfs.as_os_str().as_bytes())?,
            cstr("--ready-fd")?,
            cstr(ready_fd.to_string())?,
            cstr("--hostname")?,
            cstr(self.request.hostname.as_str())?,
            cstr("--link")?,
            cstr(net.container_link.as_str())?,
            cstr("--address")?,
            cstr(net.address.to_string())?,
            cstr("--prefix-len")?,
            cstr(net.prefix_len.to_string())?,
            cstr("--gateway")?,
            cstr(net.gateway.to_string())?,
        ])
    }
}

/// A running isolated process, owner of its namespace set
#[derive(Debug)]
pub struct IsolatedChild {
    pid: ProcessId,
    ready: SyncPipe,
}

impl IsolatedChild {
    /// Host-visible process id (inside its own PID namespace it is 1)
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Report the bridge-wiring outcome to the child
    ///
    /// One-shot; the child blocks on this signal before configuring its
    /// network, bounded by its own timeout.
    pub fn notify_wiring(&self, status: WiringStatus) -> Result<()> {
        self.ready.signal(status.as_byte())
    }

    /// Block until the child terminates, returning its exit code
    ///
    /// Termination by signal maps to `128 + signo`, the shell convention.
    /// Ctrl+C in the launcher is forwarded to the child as SIGTERM.
    pub fn wait(&self) -> Result<i32> {
        let pid = self.pid;
        if let Err(e) = ctrlc::set_handler(move || {
            let _ = kill(pid.as_nix_pid(), Signal::SIGTERM);
        }) {
            warn!(error = %e, "could not install Ctrl+C forwarder");
        }

        loop {
            match waitpid(self.pid.as_nix_pid(), None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    debug!(code, "child exited");
                    return Ok(code);
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    debug!(signal = %signal, "child terminated by signal");
                    return Ok(128 + signal as i32);
                }
                Ok(status) => {
                    debug!(?status, "child status");
                }
                Err(Errno::EINTR) => {}
                Err(Errno::ECHILD) => {
                    return Err(Error::Child {
                        message: "child process no longer exists".to_string(),
                    });
                }
                Err(e) => {
                    return Err(Error::Child {
                        message: format!("wait failed: {e}"),
                    });
                }
            }
        }
    }
}

/// Write `setgroups`, `gid_map`, and `uid_map` for a freshly cloned child
///
/// `setgroups` must be denied before an unprivileged process may write a
/// gid map.
fn write_id_maps(pid: ProcessId, uid_map: IdMapping, gid_map: IdMapping) -> Result<()> {
    let base = format!("/proc/{pid}");

    fs::write(format!("{base}/setgroups"), "deny")?;
    fs::write(format!("{base}/gid_map"), gid_map.as_line())?;
    fs::write(format!("{base}/uid_map"), uid_map.as_line())?;

    debug!(pid = %pid, "identity maps written");
    Ok(())
}

fn abort_child(pid: ProcessId) {
    let _ = kill(pid.as_nix_pid(), Signal::SIGKILL);
    let _ = waitpid(pid.as_nix_pid(), None);
}

fn cstr(bytes: impl Into<Vec<u8>>) -> Result<CString> {
    CString::new(bytes).map_err(|_| Error::config("argument contains an interior NUL byte"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = IsolationRequest::new("/tmp/rootfs");

        assert!(request.namespaces.has_any());
        assert_eq!(request.uid_map.container_id, 0);
        assert_eq!(request.gid_map.container_id, 0);
        assert_eq!(request.hostname, "burrow");
    }

    #[test]
    fn test_validate_rejects_missing_rootfs() {
        let request = IsolationRequest::new("/definitely/not/a/rootfs");
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_existing_dir() {
        let request = IsolationRequest::new(std::env::temp_dir());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        let mut request = IsolationRequest::new(std::env::temp_dir());
        request.hostname = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_init_argv_shape() {
        let launcher = Launcher::new(IsolationRequest::new("/tmp/rootfs"));
        let argv = launcher.init_argv(7).unwrap();

        assert_eq!(argv[0].to_str().unwrap(), "/proc/self/exe");
        assert_eq!(argv[1].to_str().unwrap(), "init");

        let rendered: Vec<&str> = argv.iter().map(|a| a.to_str().unwrap()).collect();
        assert!(rendered.contains(&"--ready-fd"));
        assert!(rendered.contains(&"7"));
        assert!(rendered.contains(&"vm1"));
        assert!(rendered.contains(&"10.10.10.2"));
        assert!(rendered.contains(&"10.10.10.1"));
    }
}
