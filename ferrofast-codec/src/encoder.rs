/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST message encoder session.
//!
//! An [`Encoder`] owns one stream's mutable state: the byte sink, the known
//! templates, the dictionary of previous values and the pinned current
//! template. The per-message presence map precedes the body on the wire but
//! is finalized last, so field bytes are buffered and the two are flushed
//! together on message completion.

use crate::dictionary::Dictionary;
use crate::operators::encode_field;
use crate::pmap::PresenceMap;
use crate::writer::StreamWriter;
use ferrofast_core::{FastError, Message, Result, Template};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, trace};

/// Single-threaded FAST encoder session over a byte sink.
#[derive(Debug)]
pub struct Encoder<W> {
    sink: W,
    templates: HashMap<u32, Arc<Template>>,
    dictionary: Dictionary,
    current_template: Option<u32>,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder session with the stream's known templates.
    pub fn new(sink: W, templates: impl IntoIterator<Item = Template>) -> Self {
        Self {
            sink,
            templates: templates
                .into_iter()
                .map(|t| (t.id, Arc::new(t)))
                .collect(),
            dictionary: Dictionary::new(),
            current_template: None,
        }
    }

    /// Encodes one message and flushes it to the sink.
    ///
    /// The template id is elided when it matches the pinned current
    /// template; otherwise the id is written and becomes current.
    ///
    /// # Errors
    /// Any [`FastError`]; the session state is unspecified after a failure
    /// and the caller must [`Encoder::reset`] or discard the session.
    pub fn encode(&mut self, message: &Message) -> Result<()> {
        let template = self
            .templates
            .get(&message.template_id)
            .cloned()
            .ok_or(FastError::UnknownTemplate(message.template_id))?;

        for name in message.fields.keys() {
            if !template.defines(name) {
                return Err(FastError::UnknownField(name.clone()));
            }
        }

        let mut pmap = PresenceMap::new();
        let mut body = StreamWriter::new();

        if self.current_template == Some(template.id) {
            pmap.set_next_bit(false);
        } else {
            pmap.set_next_bit(true);
            body.write_uint(false, u64::from(template.id))?;
        }

        for instruction in &template.instructions {
            let value = message
                .fields
                .get(&instruction.name)
                .cloned()
                .unwrap_or_default();
            encode_field(instruction, &value, &mut body, &mut pmap, &mut self.dictionary)?;
        }

        self.current_template = Some(template.id);

        let header = pmap.encode();
        self.sink.write_all(&header)?;
        self.sink.write_all(body.as_slice())?;

        trace!(
            template_id = template.id,
            pmap_bits = pmap.len(),
            body_len = body.len(),
            "encoded message"
        );
        Ok(())
    }

    /// Pins a template as the stream's current template, eliding its id
    /// from the next message.
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
        debug!("encoder session reset");
    }

    /// Returns the session dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Returns a reference to the underlying sink.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consumes the session and returns the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink
    }
}
