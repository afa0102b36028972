use assert_cmd::Command;
use predicates::prelude::*;

/// Check if running as root
fn is_root() -> bool {
    unsafe { libc::getuid() == 0 }
}

#[test]
fn test_help_command() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Minimal namespace container runtime"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("namespaces"));
}

#[test]
fn test_init_is_hidden() {
    // Stage two exists only for the re-exec; it must not be advertised
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init").not());
}

#[test]
fn test_version_command() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("burrow"));
}

#[test]
fn test_invalid_command() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_run_without_rootfs() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_run_with_missing_rootfs_fails_before_wiring() {
    // The end-to-end failure path: a nonexistent root fails validation
    // with exit code 1 before any clone or network wiring
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .arg("/no/such/rootfs")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("/no/such/rootfs"));
}

#[test]
fn test_run_rejects_invalid_link_prefix() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .arg("/tmp")
        .arg("--link-prefix")
        .arg("far-too-long-for-a-link")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("link"));
}

#[test]
fn test_run_rejects_invalid_address() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .arg("/tmp")
        .arg("--address")
        .arg("not-an-address")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_run_help_shows_network_flags() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--bridge"))
        .stdout(predicate::str::contains("--link-prefix"))
        .stdout(predicate::str::contains("--address"))
        .stdout(predicate::str::contains("--gateway"))
        .stdout(predicate::str::contains("--hostname"));
}

#[test]
fn test_namespaces_no_root_needed() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("namespaces")
        .assert()
        .success()
        .stdout(predicate::str::contains("Namespace information"))
        .stdout(predicate::str::contains("mnt"));
}

#[test]
fn test_namespaces_for_missing_pid() {
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("namespaces")
        .arg("--pid")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such process"));
}

#[test]
#[ignore] // Requires root, a populated /tmp/rootfs, and the br0 bridge
fn test_end_to_end_shell_session() {
    if !is_root() {
        return;
    }

    // A shell that exits immediately still has to come up with vm1
    // configured; a clean exit maps to exit code 0
    Command::new(env!("CARGO_BIN_EXE_burrow"))
        .arg("run")
        .arg("/tmp/rootfs")
        .write_stdin("ip addr show vm1\nexit\n")
        .assert()
        .success();
}
