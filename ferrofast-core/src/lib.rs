/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # FerroFast Core
//!
//! Core types for the FerroFast FAST protocol codec.
//!
//! This crate provides the building blocks shared across all FerroFast crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field values**: The [`FieldValue`] tagged variant and typed accessors
//! - **Instructions**: [`Instruction`], [`Operator`], [`Presence`], [`ValueType`]
//! - **Templates**: [`Template`], the ordered instruction sequence
//! - **Messages**: [`Message`], the application-facing tag/value binding
//!
//! The wire codec itself lives in `ferrofast-codec`; template source parsing
//! (XML or otherwise) is an external collaborator that delivers resolved
//! [`Template`] values.

pub mod error;
pub mod instruction;
pub mod message;
pub mod template;
pub mod value;

pub use error::{FastError, Result};
pub use instruction::{Instruction, Operator, Presence, ValueType};
pub use message::Message;
pub use template::Template;
pub use value::{FieldMap, FieldValue};
