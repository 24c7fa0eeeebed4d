//! LNET router format (`router_v1`).

use crate::WireKind;
use crate::error::DecodeResult;
use crate::fields::Fields;
use crate::records::RouterRecord;

/// Decodes `1;router;cpu;mem;bytes`.
pub fn decode_router_v1(s: &str) -> DecodeResult<RouterRecord> {
    let mut fields = Fields::new(WireKind::RouterV1, s);
    fields.version()?;
    let record = RouterRecord {
        name: fields.next_string("router name")?,
        pct_cpu: fields.next_pct("pct_cpu")?,
        pct_mem: fields.next_pct("pct_mem")?,
        bytes: fields.next_u64("bytes")?,
    };
    fields.finish()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_v1() {
        let record = decode_router_v1("1;rtr1;0.5;1.5;123456789").unwrap();
        assert_eq!(record.name, "rtr1");
        assert_eq!(record.bytes, 123_456_789);
    }

    #[test]
    fn test_router_v1_missing_bytes() {
        let err = decode_router_v1("1;rtr1;0.5;1.5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing router_v1 string (header part): missing bytes"
        );
    }
}
