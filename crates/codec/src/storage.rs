//! Storage server and device formats (`ost_v2`, `oss_v1`, `ost_v1`).

use crate::WireKind;
use crate::error::DecodeResult;
use crate::fields::Fields;
use crate::records::{Capacity, DeviceRecord, ServerLoadRecord, ServerRecord};

/// Decodes `2;oss;cpu;mem;` followed by zero or more seven-field device groups.
pub fn decode_ost_v2(s: &str) -> DecodeResult<ServerRecord> {
    let mut fields = Fields::new(WireKind::OstV2, s);
    fields.version()?;
    let name = fields.next_string("oss name")?;
    let pct_cpu = fields.next_pct("pct_cpu")?;
    let pct_mem = fields.next_pct("pct_mem")?;

    fields.set_part("ost");
    let mut devices = Vec::new();
    while !fields.is_exhausted() {
        let device_name = fields.next_string("ost name")?;
        devices.push(device_counters(&mut fields, device_name, Some(name.clone()))?);
    }
    fields.finish()?;

    Ok(ServerRecord {
        name,
        pct_cpu,
        pct_mem,
        devices,
    })
}

/// Decodes `1;oss;cpu;mem`.
pub fn decode_oss_v1(s: &str) -> DecodeResult<ServerLoadRecord> {
    let mut fields = Fields::new(WireKind::OssV1, s);
    fields.version()?;
    let record = ServerLoadRecord {
        name: fields.next_string("oss name")?,
        pct_cpu: fields.next_pct("pct_cpu")?,
        pct_mem: fields.next_pct("pct_mem")?,
    };
    fields.finish()?;
    Ok(record)
}

/// Decodes `1;oss;ost;read;write;kbytes_free;kbytes_total;inodes_free;inodes_total`.
pub fn decode_ost_v1(s: &str) -> DecodeResult<DeviceRecord> {
    let mut fields = Fields::new(WireKind::OstV1, s);
    fields.version()?;
    let server = fields.next_string("oss name")?;
    let name = fields.next_string("ost name")?;
    let record = device_counters(&mut fields, name, Some(server))?;
    fields.finish()?;
    Ok(record)
}

fn device_counters(
    fields: &mut Fields<'_>,
    name: String,
    server: Option<String>,
) -> DecodeResult<DeviceRecord> {
    let read_bytes = fields.next_u64("read_bytes")?;
    let write_bytes = fields.next_u64("write_bytes")?;
    let kbytes_free = fields.next_u64("kbytes_free")?;
    let kbytes_total = fields.next_u64("kbytes_total")?;
    let inodes_free = fields.next_u64("inodes_free")?;
    let inodes_total = fields.next_u64("inodes_total")?;
    Ok(DeviceRecord {
        name,
        server,
        read_bytes,
        write_bytes,
        kbytes: Capacity::new(kbytes_free, kbytes_total),
        inodes: Capacity::new(inodes_free, inodes_total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;

    #[test]
    fn test_ost_v2_with_devices() {
        let record = decode_ost_v2(
            "2;oss1;12.5;40.0;lustre-OST0000;100;200;30;100;5;10;lustre-OST0001;1;2;3;4;5;6;",
        )
        .unwrap();
        assert_eq!(record.name, "oss1");
        assert_eq!(record.pct_cpu, 12.5);
        assert_eq!(record.devices.len(), 2);

        let first = &record.devices[0];
        assert_eq!(first.name, "lustre-OST0000");
        assert_eq!(first.server.as_deref(), Some("oss1"));
        assert_eq!(first.read_bytes, 100);
        assert_eq!(first.write_bytes, 200);
        assert_eq!(first.kbytes, Capacity::new(30, 100));
        assert_eq!(first.inodes, Capacity::new(5, 10));
    }

    #[test]
    fn test_ost_v2_without_devices() {
        let record = decode_ost_v2("2;oss1;1;2").unwrap();
        assert!(record.devices.is_empty());
    }

    #[test]
    fn test_ost_v2_truncated_device() {
        let err = decode_ost_v2("2;oss1;1;2;lustre-OST0000;1;2;3;4").unwrap_err();
        match err {
            DecodeError::Malformed { part, message, .. } => {
                assert_eq!(part, "ost");
                assert!(message.contains("missing inodes_free"), "{}", message);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ost_v2_bad_counter() {
        let err = decode_ost_v2("2;oss1;1;2;ost;1;-2;3;4;5;6").unwrap_err();
        assert!(err.to_string().contains("write_bytes"));
    }

    #[test]
    fn test_oss_v1() {
        let record = decode_oss_v1("1;oss2;3.0;4.0").unwrap();
        assert_eq!(record.name, "oss2");
        assert_eq!(record.pct_mem, 4.0);
        assert!(decode_oss_v1("1;oss2;3.0;4.0;extra").is_err());
    }

    #[test]
    fn test_ost_v1() {
        let record = decode_ost_v1("1;oss3;lustre-OST0002;10;20;30;100;40;50").unwrap();
        assert_eq!(record.server.as_deref(), Some("oss3"));
        assert_eq!(record.name, "lustre-OST0002");
        assert_eq!(record.kbytes.used(), 70);
        assert_eq!(record.inodes.used(), 10);
    }

    #[test]
    fn test_wrong_version() {
        let err = decode_ost_v1("2;oss3;ost;1;2;3;4;5;6").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedVersion { .. }));
    }
}
