//! Stage two of the launch: namespace-side initialization
//!
//! Entered only through the launcher's re-exec of `/proc/self/exe`; runs
//! as PID 1 of the new PID namespace. Order matters here: hostname, root
//! pivot, the wiring signal, link visibility, address and route, and only
//! then the interactive shell. Every setup failure is fatal — a partially
//! initialized container is never handed to the user.

use std::os::unix::process::ExitStatusExt;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

use burrow_core::{LinkName, NetworkConfig};
use burrow_namespace::{SignalReceiver, WiringStatus, rootfs};
use burrow_net::{NetworkConfigurator, NetworkWait, SysfsLister};

use crate::cli::InitArgs;

const SHELL: &str = "/bin/sh";
const PROMPT: &str = "-[burrow]- # ";

pub async fn execute(args: InitArgs) -> Result<i32> {
    info!("namespace setup");

    nix::unistd::sethostname(&args.hostname).context("failed to set hostname")?;

    rootfs::switch_root(&args.rootfs).context("failed to switch root filesystem")?;

    let wait = NetworkWait::default();

    // One-shot outcome of the host-side wiring task.
    // SAFETY: the launcher passes an inherited pipe read end that nothing
    // else in this process owns.
    let ready = unsafe { SignalReceiver::from_raw_fd(args.ready_fd) };
    let status = ready
        .wait(wait.timeout, "bridge wiring")
        .context("network setup")?;
    match WiringStatus::from_byte(status).context("network setup")? {
        WiringStatus::Wired => {}
        WiringStatus::Failed => bail!("network setup failed on the host side"),
    }

    // The signal says the move happened; confirm the link is actually
    // visible in this namespace before touching it
    let link = LinkName::new(args.link).context("invalid link name")?;
    wait.wait_for(&SysfsLister::new(), &link)
        .await
        .context("network setup")?;

    let network = NetworkConfig {
        container_link: link,
        address: args.address,
        prefix_len: args.prefix_len,
        gateway: args.gateway,
        ..NetworkConfig::default()
    };
    NetworkConfigurator::new(network)
        .configure()
        .await
        .context("network setup")?;

    run_shell()
}

/// Spawn the interactive shell as a child of PID 1, with the minimal
/// fixed environment and inherited stdio
fn run_shell() -> Result<i32> {
    info!("starting interactive shell");

    let status = Command::new(SHELL)
        .env_clear()
        .env("PS1", PROMPT)
        .status()
        .with_context(|| format!("failed to run {SHELL}"))?;

    Ok(status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0)))
}
