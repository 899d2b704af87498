use crate::errors::{DecodeError, ErrorKind};
use crate::field::Fields;
use crate::options::{DecodeOptions, SkipPolicy};
use crate::varint::{decode_varint32, decode_varint64, zigzag_decode32, zigzag_decode64};
use crate::wire_type::{FieldTag, WireType};

/// Sequential reader of primitive values from an encoded message.
///
/// A decoder borrows a complete message buffer and keeps a cursor into it.
/// Each successful read advances the cursor by exactly the number of bytes
/// the value occupies. Reads are all-or-nothing: if a read fails, the cursor
/// stays where it was before the read.
///
/// Byte spans returned by [`read_bytes`](Self::read_bytes) and
/// [`read_length_delimited`](Self::read_length_delimited) are views into the
/// borrowed buffer rather than copies.
///
/// ```
/// use protowire::{Decoder, WireType};
///
/// # fn main() -> Result<(), protowire::DecodeError> {
/// // Field 1 = 150, then field 2 = "hi".
/// let buf = [0x08, 0x96, 0x01, 0x12, 0x02, 0x68, 0x69];
/// let mut decoder = Decoder::new(&buf);
///
/// let tag = decoder.read_tag()?;
/// assert_eq!((tag.field_number, tag.wire_type), (1, WireType::Varint));
/// assert_eq!(decoder.read_varint()?, 150);
///
/// let tag = decoder.read_tag()?;
/// decoder.skip(tag.wire_type)?;
/// assert!(decoder.is_at_end());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    offset: usize,
    opts: DecodeOptions,
}

impl<'a> Decoder<'a> {
    /// Create a decoder which reads `buf` from the start, using default
    /// options.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, DecodeOptions::default())
    }

    /// Create a decoder with custom options.
    ///
    /// Use `DecodeOptions::from_env()` to apply settings from environment
    /// variables.
    pub fn with_options(buf: &'a [u8], opts: DecodeOptions) -> Self {
        Self {
            buf,
            offset: 0,
            opts,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.opts
    }

    /// Return the offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Return the length of the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Return true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Return the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Return true if all bytes have been read.
    pub fn is_at_end(&self) -> bool {
        self.offset == self.buf.len()
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    /// Read `len` bytes, returning a view into the buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(self.error(ErrorKind::OutOfBounds {
                requested: len,
                remaining,
            }));
        }
        let bytes = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Read a varint whose value fits in 32 bits.
    ///
    /// This is the fast path for tags, lengths and small integers. Values
    /// which need more than 32 bits fail with
    /// [`MalformedVarint`](ErrorKind::MalformedVarint) rather than being
    /// truncated. Use [`read_varint64`](Self::read_varint64) for 64-bit
    /// fields.
    pub fn read_varint(&mut self) -> Result<u32, DecodeError> {
        let (value, len) =
            decode_varint32(&self.buf[self.offset..]).map_err(|err| self.error(err.into()))?;
        self.offset += len;
        Ok(value)
    }

    /// Read a varint of up to 64 bits.
    ///
    /// This supports the full range of varints allowed by the protocol, up to
    /// 10 bytes.
    pub fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let (value, len) =
            decode_varint64(&self.buf[self.offset..]).map_err(|err| self.error(err.into()))?;
        self.offset += len;
        Ok(value)
    }

    /// Read a 4-byte little-endian unsigned integer.
    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read an 8-byte little-endian unsigned integer.
    ///
    /// The value is composed of two 32-bit words, low word first.
    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        let bytes: [u8; 8] = self.read_array()?;
        let (low, high) = bytes.split_at(4);
        let word = |half: &[u8]| {
            let mut word = [0; 4];
            word.copy_from_slice(half);
            u32::from_le_bytes(word) as u64
        };
        Ok(word(low) | (word(high) << 32))
    }

    /// Read a 4-byte little-endian IEEE-754 float.
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read an 8-byte little-endian IEEE-754 double.
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a field tag.
    ///
    /// Tags are decoded using the 32-bit varint path, so field numbers are
    /// limited to 29 bits.
    pub fn read_tag(&mut self) -> Result<FieldTag, DecodeError> {
        self.atomic(|dec| {
            let start = dec.offset;
            let raw = dec.read_varint()?;
            FieldTag::from_raw(raw).map_err(|kind| DecodeError::new(kind, start))
        })
    }

    /// Read a varint length prefix followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        self.atomic(|dec| {
            let len = dec.read_varint()?;
            dec.read_bytes(len as usize)
        })
    }

    /// Read a length-delimited embedded message.
    ///
    /// Returns a decoder over the message body which uses the same options
    /// as `self`. Error positions reported by the returned decoder are
    /// relative to the start of the embedded message.
    pub fn read_message(&mut self) -> Result<Decoder<'a>, DecodeError> {
        let body = self.read_length_delimited()?;
        Ok(Decoder::with_options(body, self.opts))
    }

    /// Read a varint field with schema type `int32`.
    ///
    /// Negative values are encoded as 10-byte varints. The value is the low
    /// 32 bits of the decoded 64-bit integer.
    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        self.read_varint64().map(|val| val as i32)
    }

    /// Read a varint field with schema type `int64`.
    pub fn read_int64(&mut self) -> Result<i64, DecodeError> {
        self.read_varint64().map(|val| val as i64)
    }

    /// Read a varint field with schema type `uint64`.
    pub fn read_uint64(&mut self) -> Result<u64, DecodeError> {
        self.read_varint64()
    }

    /// Read a zigzag-encoded varint field with schema type `sint32`.
    pub fn read_sint32(&mut self) -> Result<i32, DecodeError> {
        self.read_varint().map(zigzag_decode32)
    }

    /// Read a zigzag-encoded varint field with schema type `sint64`.
    pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
        self.read_varint64().map(zigzag_decode64)
    }

    /// Read a varint field with schema type `bool`.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_varint64().map(|val| val != 0)
    }

    /// Read a field with schema type `sfixed32`.
    pub fn read_sfixed32(&mut self) -> Result<i32, DecodeError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a field with schema type `sfixed64`.
    pub fn read_sfixed64(&mut self) -> Result<i64, DecodeError> {
        self.read_fixed64().map(|val| val as i64)
    }

    /// Skip over one value of the given wire type.
    ///
    /// Length-delimited values are skipped without reading their contents.
    /// Group wire types are handled according to the decoder's
    /// [`SkipPolicy`].
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        let start = self.offset;
        match wire_type {
            WireType::Varint => {
                self.read_varint64()?;
            }
            WireType::Fixed64 => {
                self.read_bytes(8)?;
            }
            WireType::Fixed32 => {
                self.read_bytes(4)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::StartGroup | WireType::EndGroup => match self.opts.skip_policy {
                SkipPolicy::Strict => {
                    return Err(self.error(ErrorKind::UnsupportedWireType(wire_type)));
                }
                SkipPolicy::Permissive => {}
            },
        }

        if self.opts.trace {
            eprintln!(
                "skipped {} value of {} bytes at offset {}",
                wire_type,
                self.offset - start,
                start
            );
        }

        Ok(())
    }

    /// Return an iterator over the remaining fields in the buffer.
    ///
    /// See [`Fields`].
    pub fn fields(&mut self) -> Fields<'_, 'a> {
        Fields::new(self)
    }

    /// Run a sequence of reads, restoring the cursor if any of them fails.
    pub(crate) fn atomic<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let start = self.offset;
        let result = read(self);
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> DecodeError {
        DecodeError::new(kind, self.offset)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N)?;
        let mut array = [0; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }
}
