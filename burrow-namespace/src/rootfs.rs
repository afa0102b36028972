//! Root filesystem switch via `pivot_root(2)`
//!
//! Runs inside the new mount namespace, before anything else touches the
//! filesystem. Any failing step aborts the whole launch: pivot is not
//! idempotent, and a half-pivoted root is not a state worth continuing
//! from.

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use nix::mount::{MntFlags, MsFlags, mount, umount2};
use nix::unistd::{chdir, pivot_root};
use tracing::debug;

use burrow_core::{Error, Result};

/// Staging directory the old root is pivoted into, relative to the new root
const PUT_OLD: &str = ".pivot_root";

/// Replace the calling process's filesystem root with `new_root`.
///
/// Sequence: mount a fresh `proc` under the new root, make the new root a
/// mount point by bind-mounting it onto itself recursively, stage the old
/// root under `.pivot_root`, pivot, then lazily detach and remove the old
/// root so no path back to it remains. In-flight descriptors stay valid
/// until their last reference drops.
///
/// Calling this twice fails: after the first pivot the staging directory
/// no longer exists at the pre-pivot location.
///
/// # Errors
/// Returns a setup error naming the first failing step.
pub fn switch_root(new_root: &Path) -> Result<()> {
    debug!(new_root = %new_root.display(), "switching root filesystem");

    let proc_dir = new_root.join("proc");
    fs::create_dir_all(&proc_dir)?;
    mount(
        Some(&proc_dir),
        &proc_dir,
        Some("proc"),
        MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC,
        None::<&str>,
    )
    .map_err(|e| Error::setup("mount proc", e))?;

    // pivot_root requires the new root to be a mount point distinct from
    // its parent
    mount(
        Some(new_root),
        new_root,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| Error::setup("bind mount new root", e))?;

    let put_old = new_root.join(PUT_OLD);
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(&put_old)?;

    pivot_root(new_root, &put_old).map_err(|e| Error::setup("pivot_root", e))?;

    chdir("/").map_err(|e| Error::setup("chdir to new root", e))?;

    let put_old = Path::new("/").join(PUT_OLD);
    umount2(&put_old, MntFlags::MNT_DETACH)
        .map_err(|e| Error::setup("unmount old root", e))?;
    fs::remove_dir_all(&put_old)?;

    debug!("old root detached and removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Pivoting needs an unshared mount namespace and a prepared root
    // tree; exercised by the end-to-end scenario.
    #[test]
    #[ignore] // Requires root and a populated rootfs at /tmp/rootfs
    fn test_switch_root_is_not_idempotent() {
        let root = Path::new("/tmp/rootfs");

        switch_root(root).unwrap();

        // The staging directory is gone after the first pivot, so the
        // second attempt must fail cleanly rather than pivot again.
        assert!(switch_root(root).is_err());
    }
}
