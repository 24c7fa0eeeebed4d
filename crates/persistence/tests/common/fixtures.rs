//! Topologies and wire strings shared by the integration tests.

use lmt_persistence::EntityKind;

use super::fake::FakeSpec;

/// Counters every fixture device reports: read 100, write 200,
/// kbytes 30 free of 100, inodes 5 free of 10.
pub const DEVICE_COUNTERS: &str = "100;200;30;100;5;10";

/// Counters every fixture metadata device reports: inodes 300 free of 1000,
/// kbytes 1500 free of 2000.
pub const METADATA_COUNTERS: &str = "300;1000;1500;2000";

/// Two filesystems, `home` and `scratch`.
///
/// `oss1` and `rtr1` serve both. `home` knows the `open` and `close`
/// operations, `scratch` only `open`.
pub fn two_filesystems() -> Vec<FakeSpec> {
    vec![
        FakeSpec::new("home")
            .knows(EntityKind::Server, &["oss1", "mds1"])
            .knows(EntityKind::Device, &["home-OST0000", "home-OST0001"])
            .knows(EntityKind::MetadataDevice, &["home-MDT0000", "home-MDT0001"])
            .knows(EntityKind::Operation, &["open", "close"])
            .knows(EntityKind::Router, &["rtr1"]),
        FakeSpec::new("scratch")
            .knows(EntityKind::Server, &["oss1", "oss2", "mds2"])
            .knows(EntityKind::Device, &["scratch-OST0000"])
            .knows(EntityKind::MetadataDevice, &["scratch-MDT0000"])
            .knows(EntityKind::Operation, &["open"])
            .knows(EntityKind::Router, &["rtr1"]),
    ]
}

/// An `ost_v2` string for `server` reporting `devices`.
pub fn ost_v2(server: &str, devices: &[&str]) -> String {
    let mut s = format!("2;{};12.5;40.0;", server);
    for device in devices {
        s.push_str(&format!("{};{};", device, DEVICE_COUNTERS));
    }
    s
}

/// An `mdt_v1` string for `server` reporting `(device, operations)` groups.
pub fn mdt_v1(server: &str, devices: &[(&str, &[&str])]) -> String {
    let mut s = format!("1;{};5.0;20.0;", server);
    for (device, operations) in devices {
        s.push_str(&format!(
            "{};{};{};",
            device,
            METADATA_COUNTERS,
            operations.len()
        ));
        for op in operations.iter() {
            s.push_str(&format!("{};10;20;50;", op));
        }
    }
    s
}

/// An `mds_v2` string for `device` on `server` with `operations`.
pub fn mds_v2(server: &str, device: &str, operations: &[&str]) -> String {
    let mut s = format!("2;{};{};5.0;20.0;{};", server, device, METADATA_COUNTERS);
    for op in operations {
        s.push_str(&format!("{};10;20;50;", op));
    }
    s
}

/// A `router_v1` string.
pub fn router_v1(router: &str) -> String {
    format!("1;{};3.0;4.0;987654", router)
}
