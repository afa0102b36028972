//! CLI argument definitions

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "burrow")]
#[command(about = "Minimal namespace container runtime", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch an isolated shell inside a new set of namespaces
    Run(RunArgs),

    /// Stage two of the launch; runs as PID 1 inside the new namespaces
    #[command(hide = true)]
    Init(InitArgs),

    /// Show namespace information for a process
    Namespaces {
        /// Process ID (default: current process)
        #[arg(short, long)]
        pid: Option<i32>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Root filesystem to pivot into
    pub rootfs: PathBuf,

    /// Pre-existing host bridge the container is attached to
    #[arg(long, default_value = "br0")]
    pub bridge: String,

    /// Prefix for the veth pair (<prefix>0 on the host, <prefix>1 inside)
    #[arg(long, default_value = "vm")]
    pub link_prefix: String,

    /// Address assigned inside the container
    #[arg(long, default_value = "10.10.10.2")]
    pub address: Ipv4Addr,

    /// Subnet prefix length for the container address
    #[arg(long, default_value_t = 24)]
    pub prefix_len: u8,

    /// Default gateway inside the container
    #[arg(long, default_value = "10.10.10.1")]
    pub gateway: Ipv4Addr,

    /// Hostname inside the UTS namespace
    #[arg(long, default_value = "burrow")]
    pub hostname: String,
}

/// Arguments the launcher passes to its re-executed self. Not part of the
/// public surface.
#[derive(Args)]
pub struct InitArgs {
    /// Root filesystem to pivot into
    #[arg(long)]
    pub rootfs: PathBuf,

    /// Inherited read end of the wiring-readiness pipe
    #[arg(long)]
    pub ready_fd: i32,

    /// Hostname to set in the UTS namespace
    #[arg(long)]
    pub hostname: String,

    /// Container-side link name to wait for and configure
    #[arg(long)]
    pub link: String,

    /// Address for the container link
    #[arg(long)]
    pub address: Ipv4Addr,

    /// Subnet prefix length
    #[arg(long)]
    pub prefix_len: u8,

    /// Default gateway
    #[arg(long)]
    pub gateway: Ipv4Addr,
}
