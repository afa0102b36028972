use std::net::Ipv4Addr;

use burrow_core::*;

#[test]
fn test_link_name_validation() {
    // Valid names
    assert!(LinkName::new("vm1").is_ok());
    assert!(LinkName::new("br0").is_ok());
    assert!(LinkName::new("veth_a-b.c").is_ok());
    assert!(LinkName::new("a").is_ok());

    // Invalid - empty
    assert!(LinkName::new("").is_err());

    // Invalid - too long for the kernel
    assert!(LinkName::new("a".repeat(16)).is_err());

    // Invalid - bad characters
    assert!(LinkName::new("eth 0").is_err());
    assert!(LinkName::new("eth/0").is_err());
    assert!(LinkName::new("eth:0").is_err());
}

#[test]
fn test_link_name_serialization() {
    let name = LinkName::new("vm1").unwrap();

    let json = serde_json::to_string(&name).unwrap();
    assert_eq!(json, "\"vm1\"");

    let deserialized: LinkName = serde_json::from_str(&json).unwrap();
    assert_eq!(name, deserialized);

    // Deserializing an invalid name must fail validation
    assert!(serde_json::from_str::<LinkName>("\"not a link\"").is_err());
}

#[test]
fn test_network_config_matches_original_constants() {
    let config = NetworkConfig::default();

    assert_eq!(config.bridge.as_str(), "br0");
    assert_eq!(config.host_link.as_str(), "vm0");
    assert_eq!(config.container_link.as_str(), "vm1");
    assert_eq!(config.address, Ipv4Addr::new(10, 10, 10, 2));
    assert_eq!(config.prefix_len, 24);
    assert_eq!(config.gateway, Ipv4Addr::new(10, 10, 10, 1));
}

#[test]
fn test_network_config_round_trip() {
    let config = NetworkConfig::default().with_link_prefix("ct").unwrap();

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: NetworkConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.host_link.as_str(), "ct0");
    assert_eq!(deserialized.container_link.as_str(), "ct1");
    assert_eq!(deserialized.address, config.address);
}

#[test]
fn test_error_exposes_operation_context() {
    let err = Error::setup("mount proc", nix::Error::EPERM);
    assert!(err.to_string().contains("mount proc"));

    let err = Error::network("veth create", "kernel says no");
    assert!(err.to_string().contains("veth create"));
    assert!(err.to_string().contains("kernel says no"));

    let err = Error::Bridge {
        name: "br0".to_string(),
        reason: "not a bridge device",
    };
    assert!(err.to_string().contains("br0"));
}

#[test]
fn test_process_id_conversions() {
    let pid = ProcessId::from_raw(42);
    let nix_pid: nix::unistd::Pid = pid.into();
    assert_eq!(ProcessId::from(nix_pid), pid);

    assert!(ProcessId::current().as_raw() > 0);
}
