//! Field reader for semicolon-delimited wire strings.

use std::iter::Peekable;
use std::str::{FromStr, Split};

use crate::WireKind;
use crate::error::{DecodeError, DecodeResult};

pub(crate) const DELIMITER: char = ';';

/// Largest counter value accepted. Counters must fit a signed 64-bit column.
pub(crate) const MAX_COUNTER: u64 = i64::MAX as u64;

/// Sequential reader over the fields of one wire string.
///
/// Errors are tagged with the wire kind and the part of the record currently
/// being read, so a failure in a nested device reads differently from one in
/// the server header.
pub(crate) struct Fields<'a> {
    kind: WireKind,
    part: &'static str,
    inner: Peekable<Split<'a, char>>,
}

impl<'a> Fields<'a> {
    /// Prepares `s` for reading. Surrounding whitespace and a single trailing
    /// delimiter are ignored.
    pub(crate) fn new(kind: WireKind, s: &'a str) -> Self {
        let s = s.trim();
        let s = s.strip_suffix(DELIMITER).unwrap_or(s);
        Self {
            kind,
            part: "header",
            inner: s.split(DELIMITER).peekable(),
        }
    }

    pub(crate) fn set_part(&mut self, part: &'static str) {
        self.part = part;
    }

    pub(crate) fn malformed(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::Malformed {
            kind: self.kind,
            part: self.part,
            message: message.into(),
        }
    }

    /// Reads the version field and checks its major number.
    pub(crate) fn version(&mut self) -> DecodeResult<()> {
        let raw = self.next_str("version")?;
        let major = raw.split('.').next().unwrap_or(raw);
        let major: u32 = major
            .parse()
            .map_err(|_| self.malformed(format!("invalid version '{}'", raw)))?;
        if major != self.kind.major_version() {
            return Err(DecodeError::UnsupportedVersion {
                kind: self.kind,
                version: raw.to_string(),
            });
        }
        Ok(())
    }

    /// Reads a non-empty string field.
    pub(crate) fn next_str(&mut self, what: &str) -> DecodeResult<&'a str> {
        match self.inner.next() {
            None => Err(self.malformed(format!("missing {}", what))),
            Some(field) if field.trim().is_empty() => {
                Err(self.malformed(format!("empty {}", what)))
            }
            Some(field) => Ok(field.trim()),
        }
    }

    pub(crate) fn next_string(&mut self, what: &str) -> DecodeResult<String> {
        self.next_str(what).map(str::to_string)
    }

    /// Reads a counter. Values above [`MAX_COUNTER`] are rejected.
    pub(crate) fn next_u64(&mut self, what: &str) -> DecodeResult<u64> {
        let value: u64 = self.next_parsed(what, "integer")?;
        if value > MAX_COUNTER {
            return Err(self.malformed(format!("{} out of range: {}", what, value)));
        }
        Ok(value)
    }

    pub(crate) fn next_usize(&mut self, what: &str) -> DecodeResult<usize> {
        self.next_parsed(what, "integer")
    }

    /// Reads a percentage. NaN and infinities are rejected.
    pub(crate) fn next_pct(&mut self, what: &str) -> DecodeResult<f32> {
        let value: f32 = self.next_parsed(what, "number")?;
        if !value.is_finite() {
            return Err(self.malformed(format!("{} is not finite", what)));
        }
        Ok(value)
    }

    fn next_parsed<T: FromStr>(&mut self, what: &str, expected: &str) -> DecodeResult<T> {
        let raw = self.next_str(what)?;
        raw.parse().map_err(|_| {
            self.malformed(format!("expected {} for {}, found '{}'", expected, what, raw))
        })
    }

    /// Returns true when every field has been consumed.
    pub(crate) fn is_exhausted(&mut self) -> bool {
        self.inner.peek().is_none()
    }

    /// Fails if unread fields remain.
    pub(crate) fn finish(mut self) -> DecodeResult<()> {
        if self.is_exhausted() {
            Ok(())
        } else {
            let extra = self.inner.by_ref().count();
            Err(self.malformed(format!("{} unexpected trailing field(s)", extra)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_delimiter_ignored() {
        let mut fields = Fields::new(WireKind::OssV1, "1;oss1;2.5;10.0;\n");
        fields.version().unwrap();
        assert_eq!(fields.next_str("name").unwrap(), "oss1");
        assert_eq!(fields.next_pct("cpu").unwrap(), 2.5);
        assert_eq!(fields.next_pct("mem").unwrap(), 10.0);
        assert!(fields.finish().is_ok());
    }

    #[test]
    fn test_version_minor_accepted() {
        let mut fields = Fields::new(WireKind::OstV2, "2.0;x");
        assert!(fields.version().is_ok());
    }

    #[test]
    fn test_version_mismatch() {
        let mut fields = Fields::new(WireKind::OstV2, "3;x");
        let err = fields.version().unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let mut fields = Fields::new(WireKind::RouterV1, "1;;");
        fields.version().unwrap();
        let err = fields.next_str("name").unwrap_err();
        assert!(err.to_string().contains("empty name"));
        let err = fields.next_u64("bytes").unwrap_err();
        assert!(err.to_string().contains("missing bytes"));
    }

    #[test]
    fn test_counter_range() {
        let wire = "9223372036854775807;9223372036854775808";
        let mut fields = Fields::new(WireKind::RouterV1, wire);
        assert_eq!(fields.next_u64("bytes").unwrap(), MAX_COUNTER);
        let err = fields.next_u64("bytes").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("bytes out of range: 9223372036854775808"));
    }

    #[test]
    fn test_non_finite_pct_rejected() {
        let mut fields = Fields::new(WireKind::OssV1, "NaN");
        assert!(fields.next_pct("cpu").is_err());
    }

    #[test]
    fn test_trailing_fields_rejected() {
        let mut fields = Fields::new(WireKind::OssV1, "a;b");
        fields.next_str("first").unwrap();
        let err = fields.finish().unwrap_err();
        assert!(err.to_string().contains("1 unexpected trailing field"));
    }
}
