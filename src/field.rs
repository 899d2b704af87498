use crate::decoder::Decoder;
use crate::errors::{DecodeError, ErrorKind};
use crate::options::{DecodeOptions, SkipPolicy};
use crate::varint::{zigzag_decode32, zigzag_decode64};
use crate::wire_type::WireType;

/// Wire-type and associated value of a field.
///
/// See <https://protobuf.dev/programming-guides/encoding/#structure>.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Integer value encoded as a varint.
    Varint(u64),

    /// 64-bit fixed-width value.
    Fixed64(u64),

    /// A variable-length value: bytes, string, embedded message or packed
    /// repeated field.
    LengthDelimited(&'a [u8]),

    /// Deprecated start-of-group marker.
    StartGroup,

    /// Deprecated end-of-group marker.
    EndGroup,

    /// 32-bit fixed-width value.
    Fixed32(u32),
}

impl FieldValue<'_> {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::LengthDelimited(_) => WireType::LengthDelimited,
            Self::StartGroup => WireType::StartGroup,
            Self::EndGroup => WireType::EndGroup,
            Self::Fixed32(_) => WireType::Fixed32,
        }
    }
}

#[cfg(test)]
impl FieldValue<'_> {
    /// Encode a field with the value and wire type of `self` and the given
    /// field number.
    pub(crate) fn encode(self, number: u32) -> Vec<u8> {
        use crate::varint::encode_varint;

        let mut buf = encode_varint(((number as u64) << 3) | self.wire_type() as u64);
        match self {
            Self::Varint(val) => buf.extend(encode_varint(val)),
            Self::Fixed64(val) => buf.extend(val.to_le_bytes()),
            Self::LengthDelimited(bytes) => {
                buf.extend(encode_varint(bytes.len() as u64));
                buf.extend(bytes);
            }
            Self::StartGroup | Self::EndGroup => {}
            Self::Fixed32(val) => buf.extend(val.to_le_bytes()),
        }
        buf
    }
}

/// A single decoded field of a message.
///
/// `Field`s are produced by iterating over a message using [`Fields`]. The
/// value of a field is decoded eagerly, with variable-length values returned
/// as views into the message buffer. The `get_*` methods interpret the value
/// according to the field's schema type.
///
/// # Repeated fields
///
/// Repeated fields with a primitive type may have either a packed or
/// un-packed representation. The `get_repeated_*` methods return iterators
/// which handle both cases. The returned iterators will yield a single value
/// if the field is unpacked, or all values in a packed block if the field is
/// packed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Field<'a> {
    number: u32,
    value: FieldValue<'a>,
    position: usize,
    opts: DecodeOptions,
}

impl<'a> Field<'a> {
    /// Return the field number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Return the field value.
    pub fn value(&self) -> FieldValue<'a> {
        self.value
    }

    /// Return the offset of the field's tag in the message.
    pub fn position(&self) -> usize {
        self.position
    }

    fn get_varint(&self) -> Result<u64, DecodeError> {
        match self.value {
            FieldValue::Varint(val) => Ok(val),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the value of a field with schema type `uint32`.
    pub fn get_uint32(&self) -> Result<u32, DecodeError> {
        let val = self.get_varint()?;
        u32::try_from(val).map_err(|_| self.error(ErrorKind::MalformedVarint))
    }

    /// Get the value of a field with schema type `uint64`.
    pub fn get_uint64(&self) -> Result<u64, DecodeError> {
        self.get_varint()
    }

    /// Get the value of a field with schema type `int32`.
    pub fn get_int32(&self) -> Result<i32, DecodeError> {
        self.get_varint().map(|v| v as i32)
    }

    /// Get the value of a field where the schema type is an enum.
    pub fn get_enum(&self) -> Result<i32, DecodeError> {
        self.get_int32()
    }

    /// Get the value of a field with schema type `int64`.
    pub fn get_int64(&self) -> Result<i64, DecodeError> {
        self.get_varint().map(|v| v as i64)
    }

    /// Get the value of a field with schema type `sint32`.
    pub fn get_sint32(&self) -> Result<i32, DecodeError> {
        self.get_uint32().map(zigzag_decode32)
    }

    /// Get the value of a field with schema type `sint64`.
    pub fn get_sint64(&self) -> Result<i64, DecodeError> {
        self.get_varint().map(zigzag_decode64)
    }

    /// Get the value of a field with schema type `bool`.
    pub fn get_bool(&self) -> Result<bool, DecodeError> {
        self.get_varint().map(|v| v != 0)
    }

    /// Get the value of a field with schema type `fixed32`.
    pub fn get_fixed32(&self) -> Result<u32, DecodeError> {
        match self.value {
            FieldValue::Fixed32(val) => Ok(val),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the value of a field with schema type `sfixed32`.
    pub fn get_sfixed32(&self) -> Result<i32, DecodeError> {
        self.get_fixed32().map(|v| v as i32)
    }

    /// Get the value of a field with schema type `float`.
    pub fn get_float(&self) -> Result<f32, DecodeError> {
        self.get_fixed32().map(f32::from_bits)
    }

    /// Get the value of a field with schema type `fixed64`.
    pub fn get_fixed64(&self) -> Result<u64, DecodeError> {
        match self.value {
            FieldValue::Fixed64(val) => Ok(val),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get the value of a field with schema type `sfixed64`.
    pub fn get_sfixed64(&self) -> Result<i64, DecodeError> {
        self.get_fixed64().map(|v| v as i64)
    }

    /// Get the value of a field with schema type `double`.
    pub fn get_double(&self) -> Result<f64, DecodeError> {
        self.get_fixed64().map(f64::from_bits)
    }

    /// Get the contents of a `bytes` or `string` field.
    ///
    /// The bytes of string fields are returned as-is, without checking that
    /// they are valid UTF-8.
    pub fn get_bytes(&self) -> Result<&'a [u8], DecodeError> {
        match self.value {
            FieldValue::LengthDelimited(bytes) => Ok(bytes),
            _ => Err(self.error(ErrorKind::FieldTypeMismatch)),
        }
    }

    /// Get a decoder for an embedded message.
    ///
    /// The returned decoder inherits the options of the decoder that
    /// produced this field.
    pub fn get_message(&self) -> Result<Decoder<'a>, DecodeError> {
        self.get_bytes()
            .map(|bytes| Decoder::with_options(bytes, self.opts))
    }

    /// Get one or multiple values from a `repeated uint64` field.
    pub fn get_repeated_uint64(&self) -> Result<Repeated<'a, u64>, DecodeError> {
        self.get_repeated(Self::get_uint64, Decoder::read_uint64)
    }

    /// Get one or multiple values from a `repeated int32` field.
    pub fn get_repeated_int32(&self) -> Result<Repeated<'a, i32>, DecodeError> {
        self.get_repeated(Self::get_int32, Decoder::read_int32)
    }

    /// Get one or multiple values from a `repeated int64` field.
    pub fn get_repeated_int64(&self) -> Result<Repeated<'a, i64>, DecodeError> {
        self.get_repeated(Self::get_int64, Decoder::read_int64)
    }

    /// Get one or multiple values from a `repeated fixed32` field.
    pub fn get_repeated_fixed32(&self) -> Result<Repeated<'a, u32>, DecodeError> {
        self.get_repeated(Self::get_fixed32, Decoder::read_fixed32)
    }

    /// Get one or multiple values from a `repeated fixed64` field.
    pub fn get_repeated_fixed64(&self) -> Result<Repeated<'a, u64>, DecodeError> {
        self.get_repeated(Self::get_fixed64, Decoder::read_fixed64)
    }

    /// Get one or multiple values from a `repeated float` field.
    pub fn get_repeated_float(&self) -> Result<Repeated<'a, f32>, DecodeError> {
        self.get_repeated(Self::get_float, Decoder::read_float)
    }

    /// Get one or multiple values from a `repeated double` field.
    pub fn get_repeated_double(&self) -> Result<Repeated<'a, f64>, DecodeError> {
        self.get_repeated(Self::get_double, Decoder::read_double)
    }

    /// Get the value of a repeated scalar field.
    ///
    /// `get_unpacked` reads a single value from a non-packed field and
    /// `read_packed` reads one element of a packed block.
    fn get_repeated<T>(
        &self,
        get_unpacked: fn(&Self) -> Result<T, DecodeError>,
        read_packed: ReadFn<'a, T>,
    ) -> Result<Repeated<'a, T>, DecodeError> {
        match self.value {
            FieldValue::LengthDelimited(bytes) => Ok(Repeated {
                inner: RepeatedInner::Packed {
                    decoder: Decoder::with_options(bytes, self.opts),
                    read: read_packed,
                    number: self.number,
                },
            }),
            _ => get_unpacked(self).map(|val| Repeated {
                inner: RepeatedInner::Unpacked(Some(val)),
            }),
        }
    }

    fn error(&self, kind: ErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position).with_field(self.number)
    }
}

type ReadFn<'a, T> = fn(&mut Decoder<'a>) -> Result<T, DecodeError>;

/// Iterator over a repeated scalar field.
///
/// Repeated scalar fields may use either a packed or un-packed representation.
/// See <https://protobuf.dev/programming-guides/encoding/#packed>.
pub struct Repeated<'a, T> {
    inner: RepeatedInner<'a, T>,
}

enum RepeatedInner<'a, T> {
    Unpacked(Option<T>),
    Packed {
        decoder: Decoder<'a>,
        read: ReadFn<'a, T>,
        number: u32,
    },
}

impl<T> Iterator for Repeated<'_, T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            RepeatedInner::Unpacked(val) => val.take().map(Ok),
            RepeatedInner::Packed {
                decoder,
                read,
                number,
            } => {
                if decoder.is_at_end() {
                    return None;
                }
                let result = read(decoder).map_err(|err| err.with_field(*number));
                if result.is_err() {
                    // A failed read doesn't advance the decoder, so stop here
                    // rather than reporting the same error forever.
                    self.inner = RepeatedInner::Unpacked(None);
                }
                Some(result)
            }
        }
    }
}

/// Iterator over the fields of a message.
///
/// Fields are read from the current position of a [`Decoder`] until the end
/// of its buffer. Iteration stops after the first error.
///
/// ```
/// # fn main() -> Result<(), protowire::DecodeError> {
/// use protowire::Decoder;
///
/// // Field 1 = 150, field 2 = "hi".
/// let message = [0x08, 0x96, 0x01, 0x12, 0x02, 0x68, 0x69];
///
/// let mut decoder = Decoder::new(&message);
/// let mut number = 0;
/// let mut text: &[u8] = &[];
/// for field in decoder.fields() {
///     let field = field?;
///     match field.number() {
///         1 => number = field.get_int32()?,
///         2 => text = field.get_bytes()?,
///         // Unknown fields are already skipped.
///         _ => {}
///     }
/// }
/// assert_eq!(number, 150);
/// assert_eq!(text, b"hi");
/// # Ok(()) }
/// ```
pub struct Fields<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
    done: bool,
}

impl<'d, 'a> Fields<'d, 'a> {
    /// Iterate over the fields of a message, starting from the current
    /// position of `decoder`.
    pub fn new(decoder: &'d mut Decoder<'a>) -> Self {
        Self {
            decoder,
            done: false,
        }
    }

    fn read_field(&mut self) -> Result<Field<'a>, DecodeError> {
        let opts = *self.decoder.options();
        self.decoder.atomic(|dec| {
            let position = dec.position();
            let tag = dec.read_tag()?;
            let number = tag.field_number;

            let value = match tag.wire_type {
                WireType::Varint => dec.read_varint64().map(FieldValue::Varint),
                WireType::Fixed64 => dec.read_fixed64().map(FieldValue::Fixed64),
                WireType::LengthDelimited => {
                    dec.read_length_delimited().map(FieldValue::LengthDelimited)
                }
                WireType::Fixed32 => dec.read_fixed32().map(FieldValue::Fixed32),
                WireType::StartGroup | WireType::EndGroup => match opts.skip_policy {
                    SkipPolicy::Strict => Err(DecodeError::new(
                        ErrorKind::UnsupportedWireType(tag.wire_type),
                        position,
                    )),
                    SkipPolicy::Permissive if tag.wire_type == WireType::StartGroup => {
                        Ok(FieldValue::StartGroup)
                    }
                    SkipPolicy::Permissive => Ok(FieldValue::EndGroup),
                },
            }
            .map_err(|err| err.with_field(number))?;

            if opts.trace {
                eprintln!(
                    "field {} ({}) at offset {}, {} bytes",
                    number,
                    tag.wire_type,
                    position,
                    dec.position() - position
                );
            }

            Ok(Field {
                number,
                value,
                position,
                opts,
            })
        })
    }
}

impl<'a> Iterator for Fields<'_, 'a> {
    type Item = Result<Field<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.decoder.is_at_end() {
            return None;
        }
        let field = self.read_field();
        self.done = field.is_err();
        Some(field)
    }
}
