/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Application message binding.
//!
//! A [`Message`] pairs a template id with a mapping from instruction names to
//! field values. Fields absent from the map are treated as null by the
//! operator engine; symmetrically, the decoder omits null fields, so a
//! round-tripped message compares equal to one built without explicit nulls.

use crate::value::{FieldMap, FieldValue};
use serde::{Deserialize, Serialize};

/// A FAST application message: a template id plus a tag/value dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Id of the template the message is encoded under.
    pub template_id: u32,
    /// Field values keyed by instruction name.
    pub fields: FieldMap,
}

impl Message {
    /// Creates an empty message for the given template.
    #[must_use]
    pub fn new(template_id: u32) -> Self {
        Self {
            template_id,
            fields: FieldMap::new(),
        }
    }

    /// Sets a field value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Message::set`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value for a field, or `None` if absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns the number of fields set on the message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut msg = Message::new(7);
        msg.set("Symbol", "EURUSD");
        msg.set("Qty", 250_u32);

        assert_eq!(msg.template_id, 7);
        assert_eq!(msg.get("Symbol"), Some(&FieldValue::Ascii("EURUSD".into())));
        assert_eq!(msg.get("Qty"), Some(&FieldValue::UInt32(250)));
        assert_eq!(msg.get("Missing"), None);
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_builder_style() {
        let msg = Message::new(1).with_field("A", 1_u32).with_field("B", 2_u32);
        assert_eq!(msg.len(), 2);
        assert!(!msg.is_empty());
    }
}
