//! Decoder for the [Protocol Buffers](https://protobuf.dev/) wire format.
//!
//! This crate reads the primitive values that make up an encoded message
//! from an in-memory buffer: varints, fixed-width integers, floats, field
//! tags and length-delimited byte spans. It has no knowledge of message
//! schemas. Instead it provides the building blocks a message decoder uses to
//! walk a payload, pick out the fields it knows and skip the rest.
//!
//! # Usage
//!
//! The low-level API is [`Decoder`], which reads one value at a time:
//!
//! ```
//! use protowire::{Decoder, WireType};
//!
//! # fn main() -> Result<(), protowire::DecodeError> {
//! let message = [0x08, 0x96, 0x01, 0x1d, 0x00, 0x00, 0x80, 0x3f];
//! let mut decoder = Decoder::new(&message);
//!
//! let mut id = None;
//! while !decoder.is_at_end() {
//!     let tag = decoder.read_tag()?;
//!     match (tag.field_number, tag.wire_type) {
//!         (1, WireType::Varint) => id = Some(decoder.read_varint()?),
//!         // Skip fields that are unrecognized or not useful for us.
//!         _ => decoder.skip(tag.wire_type)?,
//!     }
//! }
//! assert_eq!(id, Some(150));
//! # Ok(()) }
//! ```
//!
//! For most message decoders the [`Fields`] iterator returned by
//! [`Decoder::fields`] is more convenient. It reads the tag and value of
//! each field and provides getters which interpret the value according to
//! the field's schema type.
//!
//! # Design
//!
//! - The decoder borrows the buffer. Bytes and embedded messages are returned
//!   as slices of it, so decoding does not allocate.
//! - Every read is bounds checked and returns a [`DecodeError`] rather than
//!   panicking. A failed read does not move the cursor.
//! - Varints have a 32-bit fast path ([`Decoder::read_varint`]) used for tags
//!   and lengths, and a 64-bit path ([`Decoder::read_varint64`]) for field
//!   values. The 32-bit path reports values that don't fit as errors instead
//!   of truncating them.
//! - The deprecated group wire types can't be skipped without parsing the
//!   group contents. [`SkipPolicy`] controls whether they are reported as
//!   errors (the default) or ignored.
//!
//! # Environment variables
//!
//! [`DecodeOptions::from_env`] reads these variables:
//!
//! - `PROTOWIRE_SKIP_POLICY`: `strict` or `permissive`
//! - `PROTOWIRE_TRACE`: set to `1` to print each decoded field and skipped
//!   value to stderr

// This is a crate for parsing potentially untrusted data, so it is preferable
// to avoid unsafe code.
#![forbid(unsafe_code)]

mod decoder;
mod errors;
mod field;
mod options;
pub mod varint;
mod wire_type;

pub use decoder::Decoder;
pub use errors::{DecodeError, ErrorKind};
pub use field::{Field, FieldValue, Fields, Repeated};
pub use options::{DecodeOptions, SkipPolicy, SKIP_POLICY_VAR, TRACE_VAR};
pub use wire_type::{FieldTag, WireType};
