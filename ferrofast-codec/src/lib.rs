/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # FerroFast Codec
//!
//! Wire codec for the FAST (FIX Adapted for Streaming) protocol.
//!
//! FAST compresses streams of structured financial messages against
//! templates: each field carries a *field operator* implementing a
//! differential state machine over a shared dictionary of previously
//! transmitted values.
//!
//! ## Features
//!
//! - **Stop-bit encoding**: self-delimiting integer, string and byte-vector
//!   primitives
//! - **Presence maps**: per-message bitmap of operator-controlled fields
//! - **Field operators**: None, Constant, Default, Copy, Increment, Delta
//!   (Tail is detected and reported as unsupported)
//! - **Composite decimals**: exponent and mantissa with independent operators
//! - **Groups and sequences**: nested composites walked through the same
//!   engine
//!
//! Encoding and decoding happen through per-stream session objects,
//! [`Encoder`] and [`Decoder`], which keep their dictionaries in lock-step.

pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod operators;
pub mod pmap;
pub mod reader;
pub mod writer;

pub use decoder::Decoder;
pub use dictionary::{Dictionary, DictionaryEntry, DictionaryKey};
pub use encoder::Encoder;
pub use operators::{decode_field, encode_field};
pub use pmap::PresenceMap;
pub use reader::StreamReader;
pub use writer::StreamWriter;
