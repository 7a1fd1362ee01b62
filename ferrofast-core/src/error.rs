/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the FerroFast FAST protocol codec.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all FerroFast operations.

use crate::instruction::Operator;
use thiserror::Error;

/// Result type alias using [`FastError`] as the error type.
pub type Result<T> = std::result::Result<T, FastError>;

/// Top-level error type for all FerroFast encode/decode operations.
///
/// A failed call leaves the session state (dictionary, stream cursor)
/// unspecified; callers must reset or discard the session.
#[derive(Debug, Error)]
pub enum FastError {
    /// Truncated stop-bit sequence or byte stream.
    #[error("unexpected end of input")]
    Truncated,

    /// Value exceeds the target integer width.
    #[error("value overflows {bits}-bit target")]
    Overflow {
        /// Width of the target integer in bits.
        bits: u32,
    },

    /// Unknown template ID on decode or encode.
    #[error("unknown template id: {0}")]
    UnknownTemplate(u32),

    /// Message field that no template instruction defines.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Message value kind does not match the instruction's declared type.
    #[error("type mismatch for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Name of the offending field.
        field: String,
        /// Kind the instruction declares.
        expected: &'static str,
        /// Kind the value carries.
        actual: &'static str,
    },

    /// Null value supplied for, or decoded into, a mandatory field.
    #[error("null value in mandatory field: {0}")]
    NullInMandatory(String),

    /// Operator not supported for this field (Tail, or Delta/Increment on
    /// non-integer types).
    #[error("unsupported operator {operator:?} on field {field}")]
    UnsupportedOperator {
        /// Name of the offending field.
        field: String,
        /// The operator that cannot be applied.
        operator: Operator,
    },

    /// Presence map could not be read or references state never established.
    #[error("malformed presence map")]
    MalformedPmap,

    /// I/O error from the underlying byte sink or source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(FastError::Truncated.to_string(), "unexpected end of input");
        assert_eq!(
            FastError::UnknownTemplate(42).to_string(),
            "unknown template id: 42"
        );
        assert_eq!(
            FastError::Overflow { bits: 32 }.to_string(),
            "value overflows 32-bit target"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = FastError::TypeMismatch {
            field: "Price".to_string(),
            expected: "decimal",
            actual: "uint32",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch for field Price: expected decimal, got uint32"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: FastError = io_err.into();
        assert!(matches!(err, FastError::Io(_)));
    }
}
