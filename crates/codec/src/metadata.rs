//! Metadata server formats (`mdt_v1`, `mds_v2`).

use crate::WireKind;
use crate::error::DecodeResult;
use crate::fields::Fields;
use crate::records::{
    Capacity, LegacyMetadataRecord, MetadataDeviceRecord, MetadataServerRecord, OperationRecord,
};

/// Decodes `1;mds;cpu;mem;` followed by metadata device groups.
///
/// Each group is `mdt;inodes_free;inodes_total;kbytes_free;kbytes_total;n;`
/// followed by `n` operation groups of `op;samples;sum;sumsquares;`.
pub fn decode_mdt_v1(s: &str) -> DecodeResult<MetadataServerRecord> {
    let mut fields = Fields::new(WireKind::MdtV1, s);
    fields.set_part("mds");
    fields.version()?;
    let name = fields.next_string("mds name")?;
    let pct_cpu = fields.next_pct("pct_cpu")?;
    let pct_mem = fields.next_pct("pct_mem")?;

    let mut devices = Vec::new();
    while !fields.is_exhausted() {
        fields.set_part("mdt");
        let device_name = fields.next_string("mdt name")?;
        let (inodes, kbytes) = metadata_counters(&mut fields)?;
        let op_count = fields.next_usize("operation count")?;

        fields.set_part("ops");
        let mut operations = Vec::with_capacity(op_count.min(64));
        for _ in 0..op_count {
            operations.push(operation(&mut fields)?);
        }

        devices.push(MetadataDeviceRecord {
            name: device_name,
            kbytes,
            inodes,
            operations,
        });
    }
    fields.finish()?;

    Ok(MetadataServerRecord {
        name,
        pct_cpu,
        pct_mem,
        devices,
    })
}

/// Decodes `2;mds;mdt;cpu;mem;inodes_free;inodes_total;kbytes_free;kbytes_total;`
/// followed by operation groups until the end of the string.
pub fn decode_mds_v2(s: &str) -> DecodeResult<LegacyMetadataRecord> {
    let mut fields = Fields::new(WireKind::MdsV2, s);
    fields.version()?;
    let server = fields.next_string("mds name")?;
    let device_name = fields.next_string("mdt name")?;
    let pct_cpu = fields.next_pct("pct_cpu")?;
    let pct_mem = fields.next_pct("pct_mem")?;
    let (inodes, kbytes) = metadata_counters(&mut fields)?;

    fields.set_part("ops");
    let mut operations = Vec::new();
    while !fields.is_exhausted() {
        operations.push(operation(&mut fields)?);
    }
    fields.finish()?;

    Ok(LegacyMetadataRecord {
        server,
        pct_cpu,
        pct_mem,
        device: MetadataDeviceRecord {
            name: device_name,
            kbytes,
            inodes,
            operations,
        },
    })
}

/// Reads `inodes_free;inodes_total;kbytes_free;kbytes_total`.
fn metadata_counters(fields: &mut Fields<'_>) -> DecodeResult<(Capacity, Capacity)> {
    let inodes_free = fields.next_u64("inodes_free")?;
    let inodes_total = fields.next_u64("inodes_total")?;
    let kbytes_free = fields.next_u64("kbytes_free")?;
    let kbytes_total = fields.next_u64("kbytes_total")?;
    Ok((
        Capacity::new(inodes_free, inodes_total),
        Capacity::new(kbytes_free, kbytes_total),
    ))
}

fn operation(fields: &mut Fields<'_>) -> DecodeResult<OperationRecord> {
    Ok(OperationRecord {
        name: fields.next_string("operation name")?,
        samples: fields.next_u64("samples")?,
        sum: fields.next_u64("sum")?,
        sum_squares: fields.next_u64("sumsquares")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;

    const MDT_V1: &str = "1;mds1;5.0;20.0;\
        fs-MDT0000;100;1000;200;2000;2;open;10;20;50;close;1;2;4;\
        fs-MDT0001;1;2;3;4;0;";

    #[test]
    fn test_mdt_v1_nested() {
        let record = decode_mdt_v1(MDT_V1).unwrap();
        assert_eq!(record.name, "mds1");
        assert_eq!(record.devices.len(), 2);

        let mdt0 = &record.devices[0];
        assert_eq!(mdt0.name, "fs-MDT0000");
        assert_eq!(mdt0.inodes, Capacity::new(100, 1000));
        assert_eq!(mdt0.kbytes, Capacity::new(200, 2000));
        assert_eq!(mdt0.operations.len(), 2);
        assert_eq!(mdt0.operations[1].name, "close");
        assert_eq!(mdt0.operations[0].sum_squares, 50);

        assert!(record.devices[1].operations.is_empty());
    }

    #[test]
    fn test_mdt_v1_short_operation_list() {
        let err = decode_mdt_v1("1;mds1;5;20;fs-MDT0000;1;2;3;4;2;open;1;1;1").unwrap_err();
        match err {
            DecodeError::Malformed { part, .. } => assert_eq!(part, "ops"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mdt_v1_bad_device_counter() {
        let err = decode_mdt_v1("1;mds1;5;20;fs-MDT0000;x;2;3;4;0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing mdt_v1 string (mdt part): expected integer for inodes_free, found 'x'"
        );
    }

    #[test]
    fn test_mds_v2_flat() {
        let record =
            decode_mds_v2("2;mds1;fs-MDT0000;5;20;100;1000;200;2000;open;1;2;3;getattr;4;5;6;")
                .unwrap();
        assert_eq!(record.server, "mds1");
        assert_eq!(record.device.name, "fs-MDT0000");
        assert_eq!(record.device.inodes.used(), 900);
        assert_eq!(record.device.kbytes.used(), 1800);
        assert_eq!(record.device.operations.len(), 2);
    }

    #[test]
    fn test_mds_v2_dangling_operation() {
        assert!(decode_mds_v2("2;mds1;fs-MDT0000;5;20;1;2;3;4;open;1").is_err());
    }
}
