/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The field operator engine.
//!
//! Per-instruction encode and decode routines implementing the seven FAST
//! operators plus the composite decimal, group and sequence cases. Both
//! directions mutate the same three collaborators: the stop-bit stream, the
//! message presence map and the per-stream dictionary. The two sides must
//! leave the dictionary in identical state after every field, or the stream
//! desynchronizes.

use crate::dictionary::{Dictionary, DictionaryEntry, DictionaryKey};
use crate::pmap::PresenceMap;
use crate::reader::StreamReader;
use crate::writer::StreamWriter;
use ferrofast_core::{FastError, FieldMap, FieldValue, Instruction, Operator, Result, ValueType};
use std::io::Read;

/// Encodes one instruction's value, recursing into composites.
///
/// # Errors
/// Any [`FastError`]; nothing is guaranteed about the writer or dictionary
/// state after a failure.
pub fn encode_field(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    match instruction.value_type {
        ValueType::Decimal if !instruction.children.is_empty() => {
            encode_decimal(instruction, value, writer, pmap, dictionary)
        }
        ValueType::Group => encode_group(instruction, value, writer, pmap, dictionary),
        ValueType::Sequence => encode_sequence(instruction, value, writer, pmap, dictionary),
        _ => encode_scalar(instruction, value, writer, pmap, dictionary),
    }
}

/// Decodes one instruction's value, recursing into composites.
///
/// # Errors
/// Any [`FastError`]; nothing is guaranteed about the reader or dictionary
/// state after a failure.
pub fn decode_field<R: Read>(
    instruction: &Instruction,
    reader: &mut StreamReader<R>,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<FieldValue> {
    match instruction.value_type {
        ValueType::Decimal if !instruction.children.is_empty() => {
            decode_decimal(instruction, reader, pmap, dictionary)
        }
        ValueType::Group => decode_group(instruction, reader, pmap, dictionary),
        ValueType::Sequence => decode_sequence(instruction, reader, pmap, dictionary),
        _ => decode_scalar(instruction, reader, pmap, dictionary),
    }
}

fn encode_scalar(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    if value.is_null() && !instruction.is_optional() && instruction.operator != Operator::Constant {
        return Err(FastError::NullInMandatory(instruction.name.clone()));
    }

    match instruction.operator {
        Operator::None => {
            write_value(writer, instruction, value)?;
            dictionary.save(DictionaryKey::for_instruction(instruction), value.clone());
            Ok(())
        }
        Operator::Constant => encode_constant(instruction, value, pmap, dictionary),
        Operator::Default => encode_default(instruction, value, writer, pmap, dictionary),
        Operator::Copy | Operator::Increment => {
            encode_copy_increment(instruction, value, writer, pmap, dictionary)
        }
        Operator::Delta => encode_delta(instruction, value, writer, dictionary),
        Operator::Tail => Err(FastError::UnsupportedOperator {
            field: instruction.name.clone(),
            operator: Operator::Tail,
        }),
    }
}

/// Constants never put the value on the wire. A null input means "use the
/// constant"; a non-null input must match the template's seed, otherwise the
/// decoder could not reproduce it.
fn encode_constant(
    instruction: &Instruction,
    value: &FieldValue,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    if !value.is_null() && *value != instruction.seed {
        return Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: "constant value",
            actual: value.kind(),
        });
    }

    let key = DictionaryKey::for_instruction(instruction);
    if instruction.is_optional() {
        let present = !value.is_null();
        pmap.set_next_bit(present);
        let stored = if present {
            instruction.seed.clone()
        } else {
            FieldValue::Null
        };
        dictionary.save(key, stored);
    } else {
        dictionary.save(key, instruction.seed.clone());
    }
    Ok(())
}

fn encode_default(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    let key = DictionaryKey::for_instruction(instruction);

    if *value == instruction.seed {
        pmap.set_next_bit(false);
        dictionary.save(key, value.clone());
        return Ok(());
    }

    pmap.set_next_bit(true);
    write_value(writer, instruction, value)?;
    if !value.is_null() {
        dictionary.save(key, value.clone());
    }
    Ok(())
}

fn encode_copy_increment(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    if instruction.operator == Operator::Increment && !instruction.value_type.is_integer() {
        return Err(FastError::UnsupportedOperator {
            field: instruction.name.clone(),
            operator: Operator::Increment,
        });
    }

    let key = DictionaryKey::for_instruction(instruction);
    let previous = dictionary.load(&key);
    dictionary.save(key, value.clone());

    let elided = match &previous {
        DictionaryEntry::Undefined => *value == instruction.seed,
        DictionaryEntry::Empty => value.is_null(),
        DictionaryEntry::Assigned(prev) => {
            if instruction.operator == Operator::Increment {
                incremented(prev).is_some_and(|next| *value == next)
            } else {
                *value == *prev
            }
        }
    };

    if elided {
        pmap.set_next_bit(false);
        return Ok(());
    }

    pmap.set_next_bit(true);
    write_value(writer, instruction, value)
}

fn encode_delta(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    dictionary: &mut Dictionary,
) -> Result<()> {
    if !instruction.value_type.is_integer() {
        return Err(FastError::UnsupportedOperator {
            field: instruction.name.clone(),
            operator: Operator::Delta,
        });
    }

    let key = DictionaryKey::for_instruction(instruction);

    if value.is_null() {
        writer.write_nil();
        dictionary.save(key, FieldValue::Null);
        return Ok(());
    }

    let current = integer_of(instruction, value)?;
    let base = delta_base(instruction, &dictionary.load(&key))?;
    let delta = i64::try_from(current - base).map_err(|_| FastError::Overflow { bits: 64 })?;

    writer.write_int(instruction.is_nullable(), delta)?;
    dictionary.save(key, value.clone());
    Ok(())
}

fn decode_scalar<R: Read>(
    instruction: &Instruction,
    reader: &mut StreamReader<R>,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<FieldValue> {
    let key = DictionaryKey::for_instruction(instruction);

    let result = match instruction.operator {
        Operator::None => {
            let value = read_value(reader, instruction)?;
            dictionary.save(key, value.clone());
            value
        }
        Operator::Constant => {
            let value = if instruction.is_optional() {
                if pmap.next_bit() {
                    instruction.seed.clone()
                } else {
                    FieldValue::Null
                }
            } else {
                instruction.seed.clone()
            };
            dictionary.save(key, value.clone());
            value
        }
        Operator::Default => {
            if pmap.next_bit() {
                let value = read_value(reader, instruction)?;
                if !value.is_null() {
                    dictionary.save(key, value.clone());
                }
                value
            } else {
                dictionary.save(key, instruction.seed.clone());
                instruction.seed.clone()
            }
        }
        Operator::Copy => {
            if pmap.next_bit() {
                let value = read_value(reader, instruction)?;
                dictionary.save(key, value.clone());
                value
            } else {
                match dictionary.load(&key) {
                    DictionaryEntry::Undefined => {
                        let value = instruction.seed.clone();
                        dictionary.save(key, value.clone());
                        value
                    }
                    DictionaryEntry::Assigned(previous) => previous,
                    DictionaryEntry::Empty => FieldValue::Null,
                }
            }
        }
        Operator::Increment => {
            if !instruction.value_type.is_integer() {
                return Err(FastError::UnsupportedOperator {
                    field: instruction.name.clone(),
                    operator: Operator::Increment,
                });
            }
            if pmap.next_bit() {
                let value = read_value(reader, instruction)?;
                dictionary.save(key, value.clone());
                value
            } else {
                match dictionary.load(&key) {
                    DictionaryEntry::Undefined => {
                        let value = instruction.seed.clone();
                        dictionary.save(key, value.clone());
                        value
                    }
                    DictionaryEntry::Assigned(previous) => {
                        let next = incremented(&previous).ok_or(FastError::Overflow {
                            bits: width_bits(instruction.value_type),
                        })?;
                        dictionary.save(key, next.clone());
                        next
                    }
                    DictionaryEntry::Empty => FieldValue::Null,
                }
            }
        }
        Operator::Delta => {
            if !instruction.value_type.is_integer() {
                return Err(FastError::UnsupportedOperator {
                    field: instruction.name.clone(),
                    operator: Operator::Delta,
                });
            }
            match reader.read_int(instruction.is_nullable())? {
                None => {
                    dictionary.save(key, FieldValue::Null);
                    FieldValue::Null
                }
                Some(delta) => {
                    let base = delta_base(instruction, &dictionary.load(&key))?;
                    let value = integer_value_of(instruction, base + i128::from(delta))?;
                    dictionary.save(key, value.clone());
                    value
                }
            }
        }
        Operator::Tail => {
            return Err(FastError::UnsupportedOperator {
                field: instruction.name.clone(),
                operator: Operator::Tail,
            })
        }
    };

    if result.is_null() && !instruction.is_optional() {
        return Err(FastError::NullInMandatory(instruction.name.clone()));
    }
    Ok(result)
}

/// Composite decimal: exponent and mantissa sub-fields with independent
/// operators. The exponent is processed first regardless of child order —
/// that is the wire order, and a null exponent means the mantissa is not on
/// the wire at all.
fn encode_decimal(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    let parts = match value {
        FieldValue::Null => {
            if !instruction.is_optional() {
                return Err(FastError::NullInMandatory(instruction.name.clone()));
            }
            None
        }
        FieldValue::Decimal { mantissa, exponent } => Some((*mantissa, *exponent)),
        other => {
            return Err(FastError::TypeMismatch {
                field: instruction.name.clone(),
                expected: "decimal",
                actual: other.kind(),
            })
        }
    };

    let (exponent_child, mantissa_child) = decimal_children(instruction)?;

    let exponent_value = parts.map_or(FieldValue::Null, |(_, e)| FieldValue::Int32(e));
    encode_scalar(exponent_child, &exponent_value, writer, pmap, dictionary)?;

    if let Some((mantissa, _)) = parts {
        encode_scalar(
            mantissa_child,
            &FieldValue::Int64(mantissa),
            writer,
            pmap,
            dictionary,
        )?;
    }
    Ok(())
}

fn decode_decimal<R: Read>(
    instruction: &Instruction,
    reader: &mut StreamReader<R>,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<FieldValue> {
    let (exponent_child, mantissa_child) = decimal_children(instruction)?;

    let exponent = match decode_scalar(exponent_child, reader, pmap, dictionary)? {
        FieldValue::Null => {
            if !instruction.is_optional() {
                return Err(FastError::NullInMandatory(instruction.name.clone()));
            }
            return Ok(FieldValue::Null);
        }
        FieldValue::Int32(e) => e,
        other => {
            return Err(FastError::TypeMismatch {
                field: exponent_child.name.clone(),
                expected: "exponent",
                actual: other.kind(),
            })
        }
    };

    let mantissa = match decode_scalar(mantissa_child, reader, pmap, dictionary)? {
        FieldValue::Int64(m) => m,
        other => {
            return Err(FastError::TypeMismatch {
                field: mantissa_child.name.clone(),
                expected: "mantissa",
                actual: other.kind(),
            })
        }
    };

    Ok(FieldValue::Decimal { mantissa, exponent })
}

fn decimal_children(instruction: &Instruction) -> Result<(&Instruction, &Instruction)> {
    let exponent = instruction
        .children
        .iter()
        .find(|c| c.value_type == ValueType::Exponent);
    let mantissa = instruction
        .children
        .iter()
        .find(|c| c.value_type == ValueType::Mantissa);
    match (exponent, mantissa) {
        (Some(e), Some(m)) => Ok((e, m)),
        _ => Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: "exponent and mantissa children",
            actual: "incomplete composite",
        }),
    }
}

/// Groups are walked inline against a nested field map; the group itself
/// reserves no pmap bit. An absent optional group encodes as all-null
/// children and decodes back to absent.
fn encode_group(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    let empty = FieldMap::new();
    let fields = match value {
        FieldValue::Null => &empty,
        FieldValue::Group(map) => map,
        other => {
            return Err(FastError::TypeMismatch {
                field: instruction.name.clone(),
                expected: "group",
                actual: other.kind(),
            })
        }
    };

    for child in &instruction.children {
        let child_value = fields.get(&child.name).cloned().unwrap_or_default();
        encode_field(child, &child_value, writer, pmap, dictionary)?;
    }
    Ok(())
}

fn decode_group<R: Read>(
    instruction: &Instruction,
    reader: &mut StreamReader<R>,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<FieldValue> {
    let mut fields = FieldMap::new();
    for child in &instruction.children {
        let value = decode_field(child, reader, pmap, dictionary)?;
        if !value.is_null() {
            fields.insert(child.name.clone(), value);
        }
    }
    if fields.is_empty() {
        Ok(FieldValue::Null)
    } else {
        Ok(FieldValue::Group(fields))
    }
}

/// Sequences carry their length in the first child (Length kind), encoded
/// through the normal operator engine; remaining children repeat once per
/// element. A null length is a null sequence.
fn encode_sequence(
    instruction: &Instruction,
    value: &FieldValue,
    writer: &mut StreamWriter,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<()> {
    let length_child = sequence_length_child(instruction)?;

    let elements = match value {
        FieldValue::Null => {
            encode_scalar(length_child, &FieldValue::Null, writer, pmap, dictionary)?;
            return Ok(());
        }
        FieldValue::Sequence(elements) => elements,
        other => {
            return Err(FastError::TypeMismatch {
                field: instruction.name.clone(),
                expected: "sequence",
                actual: other.kind(),
            })
        }
    };

    let length =
        u32::try_from(elements.len()).map_err(|_| FastError::Overflow { bits: 32 })?;
    encode_scalar(
        length_child,
        &FieldValue::UInt32(length),
        writer,
        pmap,
        dictionary,
    )?;

    for element in elements {
        for child in &instruction.children[1..] {
            let child_value = element.get(&child.name).cloned().unwrap_or_default();
            encode_field(child, &child_value, writer, pmap, dictionary)?;
        }
    }
    Ok(())
}

fn decode_sequence<R: Read>(
    instruction: &Instruction,
    reader: &mut StreamReader<R>,
    pmap: &mut PresenceMap,
    dictionary: &mut Dictionary,
) -> Result<FieldValue> {
    let length_child = sequence_length_child(instruction)?;

    let length = match decode_scalar(length_child, reader, pmap, dictionary)? {
        FieldValue::Null => return Ok(FieldValue::Null),
        FieldValue::UInt32(n) => n as usize,
        other => {
            return Err(FastError::TypeMismatch {
                field: length_child.name.clone(),
                expected: "length",
                actual: other.kind(),
            })
        }
    };

    let mut elements = Vec::with_capacity(length.min(1024));
    for _ in 0..length {
        let mut element = FieldMap::new();
        for child in &instruction.children[1..] {
            let value = decode_field(child, reader, pmap, dictionary)?;
            if !value.is_null() {
                element.insert(child.name.clone(), value);
            }
        }
        elements.push(element);
    }
    Ok(FieldValue::Sequence(elements))
}

fn sequence_length_child(instruction: &Instruction) -> Result<&Instruction> {
    instruction
        .children
        .first()
        .filter(|c| c.value_type == ValueType::Length)
        .ok_or_else(|| FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: "length child",
            actual: "incomplete sequence",
        })
}

/// Writes a typed value with the instruction's nullable framing. The type
/// check happens before any byte is emitted for the field.
fn write_value(
    writer: &mut StreamWriter,
    instruction: &Instruction,
    value: &FieldValue,
) -> Result<()> {
    if value.is_null() {
        if !instruction.is_nullable() {
            return Err(FastError::NullInMandatory(instruction.name.clone()));
        }
        writer.write_nil();
        return Ok(());
    }

    let nullable = instruction.is_nullable();
    match (instruction.value_type, value) {
        (ValueType::UInt32 | ValueType::Length, FieldValue::UInt32(v)) => {
            writer.write_uint(nullable, u64::from(*v))
        }
        (ValueType::UInt64, FieldValue::UInt64(v)) => writer.write_uint(nullable, *v),
        (ValueType::Int32 | ValueType::Exponent, FieldValue::Int32(v)) => {
            writer.write_int(nullable, i64::from(*v))
        }
        (ValueType::Int64 | ValueType::Mantissa, FieldValue::Int64(v)) => {
            writer.write_int(nullable, *v)
        }
        (ValueType::AsciiString, FieldValue::Ascii(s)) => {
            writer.write_ascii(nullable, s);
            Ok(())
        }
        (ValueType::UnicodeString, FieldValue::Unicode(s)) => {
            writer.write_byte_vector(nullable, s.as_bytes())
        }
        (ValueType::ByteVector, FieldValue::Bytes(b)) => writer.write_byte_vector(nullable, b),
        (ValueType::Decimal, FieldValue::Decimal { mantissa, exponent }) => {
            writer.write_int(nullable, i64::from(*exponent))?;
            writer.write_int(false, *mantissa)
        }
        (_, other) => Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: instruction.value_type.name(),
            actual: other.kind(),
        }),
    }
}

/// Reads a typed value with the instruction's nullable framing.
fn read_value<R: Read>(reader: &mut StreamReader<R>, instruction: &Instruction) -> Result<FieldValue> {
    let nullable = instruction.is_nullable();
    match instruction.value_type {
        ValueType::UInt32 | ValueType::Length => Ok(reader
            .read_u32(nullable)?
            .map_or(FieldValue::Null, FieldValue::UInt32)),
        ValueType::UInt64 => Ok(reader
            .read_uint(nullable)?
            .map_or(FieldValue::Null, FieldValue::UInt64)),
        ValueType::Int32 | ValueType::Exponent => Ok(reader
            .read_i32(nullable)?
            .map_or(FieldValue::Null, FieldValue::Int32)),
        ValueType::Int64 | ValueType::Mantissa => Ok(reader
            .read_int(nullable)?
            .map_or(FieldValue::Null, FieldValue::Int64)),
        ValueType::AsciiString => Ok(reader
            .read_ascii(nullable)?
            .map_or(FieldValue::Null, FieldValue::Ascii)),
        ValueType::UnicodeString => match reader.read_byte_vector(nullable)? {
            None => Ok(FieldValue::Null),
            Some(bytes) => String::from_utf8(bytes)
                .map(FieldValue::Unicode)
                .map_err(|_| FastError::TypeMismatch {
                    field: instruction.name.clone(),
                    expected: "unicode",
                    actual: "bytes",
                }),
        },
        ValueType::ByteVector => Ok(reader
            .read_byte_vector(nullable)?
            .map_or(FieldValue::Null, FieldValue::Bytes)),
        ValueType::Decimal => match reader.read_i32(nullable)? {
            None => Ok(FieldValue::Null),
            Some(exponent) => {
                let mantissa = reader.read_int_raw()?;
                Ok(FieldValue::Decimal { mantissa, exponent })
            }
        },
        ValueType::Group | ValueType::Sequence => Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: instruction.value_type.name(),
            actual: "scalar read",
        }),
    }
}

/// Previous-plus-one for the integer kinds; `None` on overflow or for
/// non-integer values.
fn incremented(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::UInt32(v) => v.checked_add(1).map(FieldValue::UInt32),
        FieldValue::UInt64(v) => v.checked_add(1).map(FieldValue::UInt64),
        FieldValue::Int32(v) => v.checked_add(1).map(FieldValue::Int32),
        FieldValue::Int64(v) => v.checked_add(1).map(FieldValue::Int64),
        _ => None,
    }
}

fn integer_of(instruction: &Instruction, value: &FieldValue) -> Result<i128> {
    match value {
        FieldValue::UInt32(v) => Ok(i128::from(*v)),
        FieldValue::UInt64(v) => Ok(i128::from(*v)),
        FieldValue::Int32(v) => Ok(i128::from(*v)),
        FieldValue::Int64(v) => Ok(i128::from(*v)),
        other => Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: instruction.value_type.name(),
            actual: other.kind(),
        }),
    }
}

/// Delta base: previous value when assigned, otherwise the seed, otherwise
/// the type's zero.
fn delta_base(instruction: &Instruction, previous: &DictionaryEntry) -> Result<i128> {
    match previous {
        DictionaryEntry::Assigned(prev) => integer_of(instruction, prev),
        _ => match &instruction.seed {
            FieldValue::Null => Ok(0),
            seed => integer_of(instruction, seed),
        },
    }
}

/// Narrows an i128 result back into the instruction's declared width.
fn integer_value_of(instruction: &Instruction, value: i128) -> Result<FieldValue> {
    let overflow = || FastError::Overflow {
        bits: width_bits(instruction.value_type),
    };
    match instruction.value_type {
        ValueType::UInt32 | ValueType::Length => u32::try_from(value)
            .map(FieldValue::UInt32)
            .map_err(|_| overflow()),
        ValueType::UInt64 => u64::try_from(value)
            .map(FieldValue::UInt64)
            .map_err(|_| overflow()),
        ValueType::Int32 | ValueType::Exponent => i32::try_from(value)
            .map(FieldValue::Int32)
            .map_err(|_| overflow()),
        ValueType::Int64 | ValueType::Mantissa => i64::try_from(value)
            .map(FieldValue::Int64)
            .map_err(|_| overflow()),
        other => Err(FastError::TypeMismatch {
            field: instruction.name.clone(),
            expected: "integer",
            actual: other.name(),
        }),
    }
}

const fn width_bits(value_type: ValueType) -> u32 {
    match value_type {
        ValueType::UInt32 | ValueType::Length | ValueType::Int32 | ValueType::Exponent => 32,
        _ => 64,
    }
}
