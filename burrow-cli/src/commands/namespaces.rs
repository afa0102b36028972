//! Namespaces command implementation

use anyhow::{Context, Result};

use burrow_core::ProcessId;
use burrow_namespace::NamespaceReport;

pub fn execute(pid: Option<i32>) -> Result<i32> {
    let target = pid.map_or_else(ProcessId::current, ProcessId::from_raw);

    println!("\nNamespace information for PID {target}");
    println!("{:-<60}", "");

    let report =
        NamespaceReport::for_pid(target).context("failed to read namespace information")?;
    print!("{report}");

    match report.is_isolated_from_init() {
        Ok(true) => println!("\n✅ Process is in isolated namespaces"),
        Ok(false) => println!("\n⚠️  Process is in host namespaces"),
        Err(e) => println!("\nCould not compare against PID 1: {e}"),
    }

    Ok(0)
}
