//! Integration tests for the default codec through the `RecordDecoder` trait.

use lmt_codec::{DecodeError, DecodedRecord, LmtCodec, RecordDecoder, WireKind};

fn sample(kind: WireKind) -> &'static str {
    match kind {
        WireKind::OstV2 => "2;oss1;1.0;2.0;fs-OST0000;1;2;3;4;5;6;",
        WireKind::MdtV1 => "1;mds1;1.0;2.0;fs-MDT0000;1;2;3;4;1;open;1;2;3;",
        WireKind::RouterV1 => "1;rtr1;1.0;2.0;42",
        WireKind::MdsV2 => "2;mds1;fs-MDT0000;1.0;2.0;1;2;3;4;open;1;2;3",
        WireKind::OssV1 => "1;oss1;1.0;2.0",
        WireKind::OstV1 => "1;oss1;fs-OST0000;1;2;3;4;5;6",
    }
}

#[test]
fn test_decode_dispatches_every_kind() {
    let codec = LmtCodec;
    for kind in WireKind::ALL {
        let record = codec
            .decode(kind, sample(kind))
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        let matches_kind = match (kind, &record) {
            (WireKind::OstV2, DecodedRecord::Server(_)) => true,
            (WireKind::MdtV1, DecodedRecord::MetadataServer(_)) => true,
            (WireKind::RouterV1, DecodedRecord::Router(_)) => true,
            (WireKind::MdsV2, DecodedRecord::LegacyMetadata(_)) => true,
            (WireKind::OssV1, DecodedRecord::ServerLoad(_)) => true,
            (WireKind::OstV1, DecodedRecord::Device(_)) => true,
            _ => false,
        };
        assert!(matches_kind, "{kind} decoded as {record:?}");
    }
}

#[test]
fn test_strings_are_not_interchangeable() {
    let codec = LmtCodec;
    // A router string has the right version for oss_v1 but one field too many.
    let err = codec.decode(WireKind::OssV1, sample(WireKind::RouterV1)).unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(err.kind(), WireKind::OssV1);

    // An ost_v2 string carries version 2, which ost_v1 rejects outright.
    let err = codec.decode(WireKind::OstV1, sample(WireKind::OstV2)).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedVersion { .. }));
}

#[test]
fn test_empty_string_is_malformed() {
    let codec = LmtCodec;
    for kind in WireKind::ALL {
        let err = codec.decode(kind, "").unwrap_err();
        assert!(err.is_malformed(), "{kind}: {err}");
    }
}
