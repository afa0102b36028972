//! One-shot pipe signals between the launcher and the isolated child
//!
//! Two signals order the launch protocol explicitly instead of by timing:
//! the child may not exec until its identity maps are written, and it may
//! not configure its network until the host-side wiring has reported in.
//! Each signal is a single status byte over a pipe, waited on with a
//! bounded `poll(2)` so a dead peer can never hang the waiter.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::unistd::{pipe2, read, write};

use burrow_core::{Error, Result};

/// Outcome of the host-side bridge wiring, as signaled to the child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringStatus {
    /// The veth pair was created, attached, and reparented
    Wired,
    /// Wiring failed; the container has no usable link
    Failed,
}

impl WiringStatus {
    /// Encode for the signal pipe
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Wired => 0,
            Self::Failed => 1,
        }
    }

    /// Decode a signal-pipe byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Self::Wired),
            1 => Ok(Self::Failed),
            other => Err(Error::Child {
                message: format!("unknown wiring status byte {other}"),
            }),
        }
    }
}

/// A one-shot signal pipe
///
/// Created close-on-exec; when the read end must survive into the
/// re-executed child, call [`SyncPipe::keep_reader_across_exec`] first.
#[derive(Debug)]
pub struct SyncPipe {
    reader: OwnedFd,
    writer: OwnedFd,
}

impl SyncPipe {
    /// Create a new signal pipe
    pub fn new() -> Result<Self> {
        let (reader, writer) =
            pipe2(OFlag::O_CLOEXEC).map_err(|e| Error::setup("pipe2", e))?;
        Ok(Self { reader, writer })
    }

    /// Send the one-shot status byte
    pub fn signal(&self, value: u8) -> Result<()> {
        loop {
            match write(&self.writer, &[value]) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => {}
                Err(e) => return Err(Error::setup("signal write", e)),
            }
        }
    }

    /// Wait for the status byte, bounded by `timeout`
    ///
    /// `what` names the awaited event in the timeout error.
    pub fn wait(&self, timeout: Duration, what: &str) -> Result<u8> {
        wait_for_byte(self.reader.as_fd(), timeout, what)
    }

    /// Raw descriptor of the read end, for handing to the re-executed child
    #[must_use]
    pub fn reader_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }

    /// Clear close-on-exec on the read end so the signal survives `execv`
    pub fn keep_reader_across_exec(&self) -> Result<()> {
        fcntl(&self.reader, FcntlArg::F_SETFD(FdFlag::empty()))
            .map_err(|e| Error::setup("fcntl F_SETFD", e))?;
        Ok(())
    }
}

/// The read end of a signal pipe, recovered in the re-executed child from
/// an inherited descriptor number
#[derive(Debug)]
pub struct SignalReceiver {
    fd: OwnedFd,
}

impl SignalReceiver {
    /// Take ownership of an inherited descriptor.
    ///
    /// # Safety
    /// `fd` must be an open pipe read end that nothing else owns.
    #[must_use]
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        }
    }

    /// Wait for the status byte, bounded by `timeout`
    pub fn wait(&self, timeout: Duration, what: &str) -> Result<u8> {
        wait_for_byte(self.fd.as_fd(), timeout, what)
    }
}

fn wait_for_byte(fd: BorrowedFd<'_>, timeout: Duration, what: &str) -> Result<u8> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let millis = u16::try_from(remaining.as_millis()).unwrap_or(u16::MAX);

        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(0) => {
                return Err(Error::Timeout {
                    what: what.to_string(),
                    limit: timeout,
                });
            }
            Ok(_) => {
                let mut buf = [0u8; 1];
                return match read(fd, &mut buf) {
                    Ok(0) => Err(Error::Child {
                        message: format!("signal pipe closed before {what}"),
                    }),
                    Ok(_) => Ok(buf[0]),
                    Err(e) => Err(Error::setup("signal read", e)),
                };
            }
            Err(Errno::EINTR) => {}
            Err(e) => return Err(Error::setup("signal poll", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_then_wait() {
        let pipe = SyncPipe::new().unwrap();
        pipe.signal(WiringStatus::Wired.as_byte()).unwrap();

        let byte = pipe.wait(Duration::from_secs(1), "wiring").unwrap();
        assert_eq!(WiringStatus::from_byte(byte).unwrap(), WiringStatus::Wired);
    }

    #[test]
    fn test_failed_status_is_distinguishable() {
        let pipe = SyncPipe::new().unwrap();
        pipe.signal(WiringStatus::Failed.as_byte()).unwrap();

        let byte = pipe.wait(Duration::from_secs(1), "wiring").unwrap();
        assert_eq!(WiringStatus::from_byte(byte).unwrap(), WiringStatus::Failed);
    }

    #[test]
    fn test_wait_times_out_without_signal() {
        let pipe = SyncPipe::new().unwrap();

        let err = pipe
            .wait(Duration::from_millis(50), "wiring")
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_unknown_status_byte_rejected() {
        assert!(WiringStatus::from_byte(7).is_err());
    }
}
