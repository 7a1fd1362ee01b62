/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Per-stream dictionary of previous field values.
//!
//! The field operators compress against the value previously transmitted for
//! each field. Entries have three states: *undefined* (never seen), *empty*
//! (explicitly set to null) and *assigned*. The encoder and decoder of one
//! stream must hold identical dictionary state after every message.

use ferrofast_core::{FieldValue, Instruction, ValueType};
use std::collections::HashMap;

/// Dictionary key: field id, name and declared type.
///
/// Sufficient within one stream of templates; named cross-template
/// dictionaries are a documented extension point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionaryKey {
    id: u32,
    name: String,
    value_type: ValueType,
}

impl DictionaryKey {
    /// Builds the key for an instruction.
    #[must_use]
    pub fn for_instruction(instruction: &Instruction) -> Self {
        Self {
            id: instruction.id,
            name: instruction.name.clone(),
            value_type: instruction.value_type,
        }
    }
}

/// State of one dictionary entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DictionaryEntry {
    /// The field has never been seen on this stream.
    #[default]
    Undefined,
    /// The field was explicitly set to null.
    Empty,
    /// The field's previous value.
    Assigned(FieldValue),
}

impl DictionaryEntry {
    /// Returns true if the entry is undefined.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns true if the entry is explicitly empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the assigned value, if any.
    #[must_use]
    pub const fn assigned(&self) -> Option<&FieldValue> {
        match self {
            Self::Assigned(v) => Some(v),
            _ => None,
        }
    }
}

/// Keyed store of previous values for one stream/session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: HashMap<DictionaryKey, DictionaryEntry>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a key; *undefined* if never saved.
    #[must_use]
    pub fn load(&self, key: &DictionaryKey) -> DictionaryEntry {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Stores a value; null stores the *empty* state.
    pub fn save(&mut self, key: DictionaryKey, value: FieldValue) {
        let entry = if value.is_null() {
            DictionaryEntry::Empty
        } else {
            DictionaryEntry::Assigned(value)
        };
        self.entries.insert(key, entry);
    }

    /// Clears all entries back to *undefined*.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of defined entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> DictionaryKey {
        DictionaryKey::for_instruction(&Instruction::new(1, name, ValueType::UInt32))
    }

    #[test]
    fn test_three_states() {
        let mut dict = Dictionary::new();
        let k = key("Qty");

        assert!(dict.load(&k).is_undefined());

        dict.save(k.clone(), FieldValue::UInt32(5));
        assert_eq!(
            dict.load(&k).assigned(),
            Some(&FieldValue::UInt32(5))
        );

        dict.save(k.clone(), FieldValue::Null);
        assert!(dict.load(&k).is_empty());
    }

    #[test]
    fn test_keying_includes_type() {
        let mut dict = Dictionary::new();
        let a = DictionaryKey::for_instruction(&Instruction::new(1, "F", ValueType::UInt32));
        let b = DictionaryKey::for_instruction(&Instruction::new(1, "F", ValueType::Int32));

        dict.save(a.clone(), FieldValue::UInt32(1));
        assert!(dict.load(&b).is_undefined());
        assert!(!dict.load(&a).is_undefined());
    }

    #[test]
    fn test_reset() {
        let mut dict = Dictionary::new();
        dict.save(key("A"), FieldValue::UInt32(1));
        assert_eq!(dict.len(), 1);

        dict.reset();
        assert!(dict.is_empty());
        assert!(dict.load(&key("A")).is_undefined());
    }
}
