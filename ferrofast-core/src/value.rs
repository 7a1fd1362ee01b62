/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field value representation for FAST messages.
//!
//! This module provides [`FieldValue`], the tagged variant that carries every
//! value the codec can move across the wire. Null is an explicit variant:
//! optional fields that are absent from a message are treated as
//! [`FieldValue::Null`] by the operator engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Field map used by messages, groups and sequence elements.
pub type FieldMap = HashMap<String, FieldValue>;

/// A single field value in a FAST message.
///
/// The variant kind must match the declared [`ValueType`] of the instruction
/// the value is encoded under; the operator engine fails with
/// `TypeMismatch` otherwise.
///
/// [`ValueType`]: crate::instruction::ValueType
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum FieldValue {
    /// Absent / null value.
    #[default]
    Null,
    /// Unsigned 32-bit integer (also used for Length fields).
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// Signed 32-bit integer (also used for decimal exponents).
    Int32(i32),
    /// Signed 64-bit integer (also used for decimal mantissas).
    Int64(i64),
    /// ASCII string, stop-bit terminated on the wire.
    Ascii(String),
    /// Unicode string, carried as a length-prefixed UTF-8 byte vector.
    Unicode(String),
    /// Raw byte vector, length-prefixed on the wire.
    Bytes(Vec<u8>),
    /// Scaled decimal number `mantissa * 10^exponent`.
    Decimal {
        /// Decimal mantissa.
        mantissa: i64,
        /// Decimal exponent.
        exponent: i32,
    },
    /// Nested group addressed as an inner field map.
    Group(FieldMap),
    /// Repeating sequence addressed as an ordered list of field maps.
    Sequence(Vec<FieldMap>),
}

impl FieldValue {
    /// Returns true if the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns a short name for the value's kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::UInt32(_) => "uint32",
            Self::UInt64(_) => "uint64",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Ascii(_) => "ascii",
            Self::Unicode(_) => "unicode",
            Self::Bytes(_) => "bytes",
            Self::Decimal { .. } => "decimal",
            Self::Group(_) => "group",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Returns the value as a `u32`, if applicable.
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a `u64`, if applicable.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `i32`, if applicable.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `i64`, if applicable.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice for either string kind.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) | Self::Unicode(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a byte slice, if applicable.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the decimal components `(mantissa, exponent)`, if applicable.
    #[must_use]
    pub const fn as_decimal_parts(&self) -> Option<(i64, i32)> {
        match self {
            Self::Decimal { mantissa, exponent } => Some((*mantissa, *exponent)),
            _ => None,
        }
    }

    /// Converts a decimal value into a [`rust_decimal::Decimal`].
    ///
    /// Returns `None` for non-decimal variants or when the scaled value does
    /// not fit `Decimal`'s 96-bit mantissa.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        let (mantissa, exponent) = self.as_decimal_parts()?;
        if exponent <= 0 {
            let scale = exponent.unsigned_abs();
            Decimal::try_from_i128_with_scale(i128::from(mantissa), scale).ok()
        } else {
            let factor = 10_i128.checked_pow(exponent as u32)?;
            let scaled = i128::from(mantissa).checked_mul(factor)?;
            Decimal::try_from_i128_with_scale(scaled, 0).ok()
        }
    }

    /// Builds a decimal field value from a [`rust_decimal::Decimal`].
    ///
    /// Returns `None` when the mantissa does not fit an `i64`.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let mantissa = i64::try_from(value.mantissa()).ok()?;
        let exponent = -(value.scale() as i32);
        Some(Self::Decimal { mantissa, exponent })
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Ascii(s) | Self::Unicode(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "{b:02x?}"),
            Self::Decimal { mantissa, exponent } => write!(f, "{mantissa}e{exponent}"),
            Self::Group(_) => write!(f, "<group>"),
            Self::Sequence(s) => write!(f, "<sequence len={}>", s.len()),
        }
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Ascii(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Ascii(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}
