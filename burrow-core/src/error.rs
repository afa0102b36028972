//! Error types for Burrow
//!
//! Every failure carries the name of the operation that produced it, so a
//! log line is enough to locate the failing step of the launch sequence.

use std::time::Duration;

use thiserror::Error;

/// Burrow error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A setup syscall (mount, pivot, chdir, unmount, clone, exec) failed.
    /// These are fatal to the isolated process and never retried.
    #[error("{operation} failed: {source}")]
    Setup {
        /// Operation that failed
        operation: &'static str,
        /// Underlying errno
        #[source]
        source: nix::Error,
    },

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A netlink operation failed, on either side of the namespace boundary
    #[error("network {operation} failed: {message}")]
    Network {
        /// Operation that failed
        operation: &'static str,
        /// Error message from the netlink layer
        message: String,
    },

    /// A network link was not visible in the current namespace
    #[error("link not found: {name}")]
    LinkNotFound {
        /// Name of the missing link
        name: String,
    },

    /// The configured bridge is missing or is not a bridge device
    #[error("bridge {name}: {reason}")]
    Bridge {
        /// Name of the bridge
        name: String,
        /// Why it is unusable
        reason: &'static str,
    },

    /// A bounded wait expired
    #[error("timed out after {limit:?} waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// The configured bound
        limit: Duration,
    },

    /// Waiting on the isolated child failed or reported a bad termination
    #[error("child process error: {message}")]
    Child {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Wrap an errno with the name of the setup operation that produced it
    #[must_use]
    pub const fn setup(operation: &'static str, source: nix::Error) -> Self {
        Self::Setup { operation, source }
    }

    /// Wrap a netlink-layer failure with its operation name
    pub fn network(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Network {
            operation,
            message: source.to_string(),
        }
    }

    /// Invalid-configuration error from any displayable message
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type alias for Burrow operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_names_operation() {
        let err = Error::setup("pivot_root", nix::Error::EINVAL);
        assert!(err.to_string().contains("pivot_root"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = Error::Timeout {
            what: "link vm1".to_string(),
            limit: Duration::from_secs(10),
        };
        let msg = err.to_string();
        assert!(msg.contains("link vm1"));
        assert!(msg.contains("10s"));
    }

    #[test]
    fn test_link_not_found_display() {
        let err = Error::LinkNotFound {
            name: "vm1".to_string(),
        };
        assert_eq!(err.to_string(), "link not found: vm1");
    }
}
