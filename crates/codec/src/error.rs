//! Decode errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::WireKind;

/// Errors produced while decoding a wire string.
///
/// `Malformed` means the string does not follow the grammar for its kind.
/// `UnsupportedVersion` means the string is well-formed enough to read its
/// version field but this decoder does not handle that version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("error parsing {kind} string ({part} part): {message}")]
    Malformed {
        kind: WireKind,
        part: &'static str,
        message: String,
    },

    #[error("unsupported {kind} version: {version}")]
    UnsupportedVersion { kind: WireKind, version: String },
}

impl DecodeError {
    /// Returns the wire kind that failed to decode.
    pub fn kind(&self) -> WireKind {
        match self {
            DecodeError::Malformed { kind, .. } | DecodeError::UnsupportedVersion { kind, .. } => {
                *kind
            }
        }
    }

    /// Returns true if the input did not follow the grammar.
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::Malformed { .. })
    }
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
