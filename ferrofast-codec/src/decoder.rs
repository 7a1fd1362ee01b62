/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST message decoder session.
//!
//! A [`Decoder`] mirrors the [`Encoder`](crate::encoder::Encoder): it owns
//! the byte source, the known templates, the dictionary and the current
//! template, and replays the operator state machine to reconstruct each
//! message. After every message the decoder's dictionary must equal the
//! encoder's.

use crate::dictionary::Dictionary;
use crate::operators::decode_field;
use crate::pmap::PresenceMap;
use crate::reader::StreamReader;
use ferrofast_core::{FastError, Message, Result, Template};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, trace};

/// Single-threaded FAST decoder session over a byte source.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: StreamReader<R>,
    templates: HashMap<u32, Arc<Template>>,
    dictionary: Dictionary,
    current_template: Option<u32>,
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder session with the stream's known templates.
    pub fn new(source: R, templates: impl IntoIterator<Item = Template>) -> Self {
        Self {
            reader: StreamReader::new(source),
            templates: templates
                .into_iter()
                .map(|t| (t.id, Arc::new(t)))
                .collect(),
            dictionary: Dictionary::new(),
            current_template: None,
        }
    }

    /// Decodes the next message from the source.
    ///
    /// # Errors
    /// Any [`FastError`]; the session state is unspecified after a failure
    /// and the caller must [`Decoder::reset`] or discard the session.
    /// Decoding at end of stream fails `FastError::Truncated`; use
    /// [`Decoder::at_eof`] to probe for stream end first.
    pub fn decode(&mut self) -> Result<Message> {
        let mut pmap = PresenceMap::read_from(&mut self.reader)?;

        let template_id = if pmap.next_bit() {
            let id = u32::try_from(self.reader.read_uint_raw()?)
                .map_err(|_| FastError::Overflow { bits: 32 })?;
            self.current_template = Some(id);
            id
        } else {
            self.current_template.ok_or(FastError::MalformedPmap)?
        };

        let template = self
            .templates
            .get(&template_id)
            .cloned()
            .ok_or(FastError::UnknownTemplate(template_id))?;

        let mut message = Message::new(template_id);
        for instruction in &template.instructions {
            let value = decode_field(
                instruction,
                &mut self.reader,
                &mut pmap,
                &mut self.dictionary,
            )?;
            if !value.is_null() {
                message.fields.insert(instruction.name.clone(), value);
            }
        }

        trace!(
            template_id,
            fields = message.len(),
            "decoded message"
        );
        Ok(message)
    }

    /// Returns true if the source is exhausted.
    ///
    /// # Errors
    /// Returns `FastError::Io` if the underlying source fails.
    pub fn at_eof(&mut self) -> Result<bool> {
        self.reader.at_eof()
    }

    /// Pins a template as the stream's current template, matching an
    /// encoder that elides the id from its next message.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` if the id is not registered.
    pub fn set_current_template(&mut self, id: u32) -> Result<()> {
        if !self.templates.contains_key(&id) {
            return Err(FastError::UnknownTemplate(id));
        }
        self.current_template = Some(id);
        Ok(())
    }

    /// Resets the session: dictionary back to undefined, no pinned template.
    pub fn reset(&mut self) {
        self.dictionary.reset();
        self.current_template = None;
        debug!("decoder session reset");
    }

    /// Returns the session dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofast_core::{FieldValue, Instruction, ValueType};

    fn single_uint_template() -> Template {
        Template::new(
            1,
            "Test",
            vec![Instruction::new(1, "Value", ValueType::UInt32)],
        )
    }

    #[test]
    fn test_decode_with_explicit_template_id() {
        let data = [0xC0, 0x81, 0x39, 0x45, 0xA3];
        let mut decoder = Decoder::new(&data[..], vec![single_uint_template()]);

        let message = decoder.decode().unwrap();
        assert_eq!(message.template_id, 1);
        assert_eq!(message.get("Value"), Some(&FieldValue::UInt32(942_755)));
        assert!(decoder.at_eof().unwrap());
    }

    #[test]
    fn test_decode_with_pinned_template() {
        let data = [0x80, 0x39, 0x45, 0xA3];
        let mut decoder = Decoder::new(&data[..], vec![single_uint_template()]);
        decoder.set_current_template(1).unwrap();

        let message = decoder.decode().unwrap();
        assert_eq!(message.get("Value"), Some(&FieldValue::UInt32(942_755)));
    }

    #[test]
    fn test_decode_unknown_template() {
        let data = [0xC0, 0x85, 0x81];
        let mut decoder = Decoder::new(&data[..], vec![single_uint_template()]);
        assert!(matches!(
            decoder.decode().unwrap_err(),
            FastError::UnknownTemplate(5)
        ));
    }

    #[test]
    fn test_decode_elided_template_without_pinning() {
        let data = [0x80, 0x81];
        let mut decoder = Decoder::new(&data[..], vec![single_uint_template()]);
        assert!(matches!(
            decoder.decode().unwrap_err(),
            FastError::MalformedPmap
        ));
    }

    #[test]
    fn test_decode_truncated_stream() {
        let data = [0xC0, 0x81];
        let mut decoder = Decoder::new(&data[..], vec![single_uint_template()]);
        assert!(matches!(decoder.decode().unwrap_err(), FastError::Truncated));
    }
}
