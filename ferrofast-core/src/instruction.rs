/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Template instructions and field operators.
//!
//! An [`Instruction`] is the immutable description of one field or composite
//! within a template: its identity, declared type, presence rule and the
//! field operator that drives the differential state machine against the
//! per-stream dictionary.

use crate::value::FieldValue;
use serde::{Deserialize, Serialize};

/// FAST field operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    /// No operator - value is always present in the stream.
    #[default]
    None,
    /// Constant - value is never in the stream, always uses the initial value.
    Constant,
    /// Default - if absent, use the initial value.
    Default,
    /// Copy - if absent, use the previous value from the dictionary.
    Copy,
    /// Increment - if absent, increment the previous value by 1.
    Increment,
    /// Delta - value in the stream is the delta from the previous value.
    Delta,
    /// Tail - value in the stream replaces the tail of the previous value.
    /// Detected and reported as unsupported, never silently skipped.
    Tail,
}

impl Operator {
    /// Returns true if this operator reads the previous value from the
    /// dictionary to elide or reconstruct the field. Every operator except
    /// Tail saves the new value; only these consult what was saved before.
    #[must_use]
    pub const fn uses_dictionary(&self) -> bool {
        matches!(self, Self::Copy | Self::Increment | Self::Delta)
    }
}

/// Field presence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Presence {
    /// The field must carry a non-null value.
    #[default]
    Mandatory,
    /// The field may be null.
    Optional,
}

/// Declared type of an instruction's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Sequence length, carried as an unsigned 32-bit integer.
    Length,
    /// Decimal mantissa, carried as a signed 64-bit integer.
    Mantissa,
    /// Decimal exponent, carried as a signed 32-bit integer.
    Exponent,
    /// ASCII string, stop-bit terminated.
    AsciiString,
    /// Unicode string, carried as a length-prefixed UTF-8 byte vector.
    UnicodeString,
    /// Raw byte vector, length-prefixed.
    ByteVector,
    /// Decimal number; with children it is the exponent/mantissa composite.
    Decimal,
    /// Nested group of fields.
    Group,
    /// Repeating sequence of field groups.
    Sequence,
}

impl ValueType {
    /// Returns true for the integer-kind types, including the decimal
    /// component and length aliases.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::UInt32
                | Self::UInt64
                | Self::Int32
                | Self::Int64
                | Self::Length
                | Self::Mantissa
                | Self::Exponent
        )
    }

    /// Returns a short name for the type, used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Length => "length",
            Self::Mantissa => "mantissa",
            Self::Exponent => "exponent",
            Self::AsciiString => "ascii",
            Self::UnicodeString => "unicode",
            Self::ByteVector => "bytes",
            Self::Decimal => "decimal",
            Self::Group => "group",
            Self::Sequence => "sequence",
        }
    }
}

/// Immutable description of one field or composite within a template.
///
/// Instructions are built once by an external template parser and never
/// mutated afterwards. `children` is non-empty only for the composite
/// decimal (exponent + mantissa sub-instructions), groups and sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Field identifier used for dictionary keying.
    pub id: u32,
    /// Field name used for dictionary keying and message binding.
    pub name: String,
    /// Presence rule.
    pub presence: Presence,
    /// Declared value type.
    pub value_type: ValueType,
    /// Field operator.
    pub operator: Operator,
    /// Initial/default value bound at template-load time; [`FieldValue::Null`]
    /// when the template binds none.
    pub seed: FieldValue,
    /// Ordered sub-instructions for composite decimal, group and sequence.
    pub children: Vec<Instruction>,
}

impl Instruction {
    /// Creates a mandatory instruction with no operator and no seed value.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.into(),
            presence: Presence::Mandatory,
            value_type,
            operator: Operator::None,
            seed: FieldValue::Null,
            children: Vec::new(),
        }
    }

    /// Sets the presence rule.
    #[must_use]
    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Sets the field operator.
    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Sets the initial/default value.
    #[must_use]
    pub fn with_seed(mut self, seed: FieldValue) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the ordered sub-instructions.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Instruction>) -> Self {
        self.children = children;
        self
    }

    /// Returns true if the field presence is optional.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.presence == Presence::Optional
    }

    /// Returns true if the wire encoding must reserve a null representation.
    ///
    /// Optional constants signal presence through the pmap instead.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.is_optional() && self.operator != Operator::Constant
    }

    /// Returns true if this instruction reserves one presence-map bit.
    #[must_use]
    pub fn reserves_pmap_bit(&self) -> bool {
        matches!(
            self.operator,
            Operator::Copy | Operator::Increment | Operator::Default | Operator::Tail
        ) || (self.operator == Operator::Constant && self.is_optional())
    }
}
