/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # FerroFast
//!
//! A FAST (FIX Adapted for Streaming) protocol codec for Rust.
//!
//! FAST is a binary, self-delimiting, stop-bit-encoded format used to
//! compress streams of structured financial messages. Messages are encoded
//! and decoded against templates; each field carries a *field operator*
//! implementing a per-field differential state machine over a per-stream
//! dictionary of previously transmitted values.
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrofast::prelude::*;
//!
//! let template = Template::new(
//!     1,
//!     "Quote",
//!     vec![
//!         Instruction::new(1, "Symbol", ValueType::AsciiString)
//!             .with_operator(Operator::Copy),
//!         Instruction::new(2, "Qty", ValueType::UInt32),
//!     ],
//! );
//!
//! let mut encoder = Encoder::new(Vec::new(), vec![template.clone()]);
//! let message = Message::new(1)
//!     .with_field("Symbol", "EURUSD")
//!     .with_field("Qty", 250_u32);
//! encoder.encode(&message).unwrap();
//!
//! let wire = encoder.into_inner();
//! let mut decoder = Decoder::new(&wire[..], vec![template]);
//! assert_eq!(decoder.decode().unwrap(), message);
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Field values, instructions, templates, messages and errors
//! - [`codec`]: Stop-bit primitives, presence maps, the operator engine and
//!   the encoder/decoder sessions

pub mod core {
    //! Field values, instructions, templates, messages and errors.
    pub use ferrofast_core::*;
}

pub mod codec {
    //! Stop-bit primitives, presence maps, the operator engine and the
    //! encoder/decoder sessions.
    pub use ferrofast_codec::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ferrofast_core::{
        FastError, FieldMap, FieldValue, Instruction, Message, Operator, Presence, Result,
        Template, ValueType,
    };

    // Codec sessions and primitives
    pub use ferrofast_codec::{
        Decoder, Dictionary, DictionaryEntry, DictionaryKey, Encoder, PresenceMap, StreamReader,
        StreamWriter,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_roundtrip() {
        let template = Template::new(
            9,
            "Ping",
            vec![Instruction::new(1, "Seq", ValueType::UInt64)],
        );

        let mut encoder = Encoder::new(Vec::new(), vec![template.clone()]);
        let message = Message::new(9).with_field("Seq", 41_u64);
        encoder.encode(&message).unwrap();

        let wire = encoder.into_inner();
        let mut decoder = Decoder::new(&wire[..], vec![template]);
        assert_eq!(decoder.decode().unwrap(), message);
        assert!(decoder.at_eof().unwrap());
    }
}
