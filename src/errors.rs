use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::varint::VarintError;
use crate::wire_type::WireType;

/// Errors decoding Protocol Buffers wire-format values.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeError {
    kind: ErrorKind,
    position: usize,
    field: Option<u32>,
}

impl DecodeError {
    /// Create an error of a given kind, encountered at byte offset `position`
    /// of the decoder's buffer.
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            field: None,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the offset of the read which failed.
    ///
    /// The offset is relative to the start of the buffer the failing decoder
    /// was created with. For a decoder created by
    /// [`read_message`](crate::Decoder::read_message) this is the start of
    /// the embedded message.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Return the field number associated with this error.
    pub fn field(&self) -> Option<u32> {
        self.field
    }

    /// Associate a field number with this error.
    pub fn with_field(mut self, field: u32) -> Self {
        self.field = Some(field);
        self
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(field) => write!(
                f,
                "error in field {} at offset {}: {}",
                field, self.position, self.kind
            ),
            None => write!(f, "error at offset {}: {}", self.position, self.kind),
        }
    }
}

impl Error for DecodeError {}

/// Enum describing the kind of a [`DecodeError`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A read required more bytes than remain in the buffer.
    OutOfBounds { requested: usize, remaining: usize },

    /// A varint was truncated by the end of the buffer, was longer than the
    /// maximum of 10 bytes, or did not fit in the requested integer width.
    MalformedVarint,

    /// Skipping a value of this wire type is not supported.
    ///
    /// This is reported for the deprecated group wire types when the decoder
    /// uses [`SkipPolicy::Strict`](crate::SkipPolicy::Strict).
    UnsupportedWireType(WireType),

    /// A field tag has a wire type that is not defined by the protocol.
    ///
    /// Wire types use 3 bits but only 6 values are assigned, so 6 and 7 are
    /// invalid.
    InvalidWireType(u8),

    /// Attempted to read a field value of a type that doesn't match the wire
    /// type.
    FieldTypeMismatch,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::OutOfBounds {
                requested,
                remaining,
            } => write!(
                f,
                "out of bounds read of {} bytes with {} remaining",
                requested, remaining
            ),
            ErrorKind::MalformedVarint => write!(f, "malformed varint"),
            ErrorKind::UnsupportedWireType(wire_type) => {
                write!(f, "unsupported wire type {}", wire_type)
            }
            ErrorKind::InvalidWireType(val) => write!(f, "invalid wire type {}", val),
            ErrorKind::FieldTypeMismatch => write!(f, "field type mismatch"),
        }
    }
}

impl From<VarintError> for ErrorKind {
    fn from(val: VarintError) -> Self {
        match val {
            VarintError::Eof => ErrorKind::OutOfBounds {
                requested: 1,
                remaining: 0,
            },
            VarintError::Truncated | VarintError::Overflow => ErrorKind::MalformedVarint,
        }
    }
}
