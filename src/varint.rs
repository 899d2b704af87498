//! Decode varints from byte slices.
//!
//! Variable length integers (_varints_) are the default encoding of integers
//! in Protocol Buffers messages, including field tags and lengths. Each byte
//! holds 7 bits of value, least significant group first, and the high bit of
//! each byte is set if more bytes follow.
//!
//! Two decoders are provided. [`decode_varint64`] handles the full range of
//! the protocol and is the one to use for 64-bit field values.
//! [`decode_varint32`] is a narrower fast path for tags, lengths and other
//! values known to fit in 32 bits. It reports an error rather than
//! truncating values that don't fit.
//!
//! See <https://protobuf.dev/programming-guides/encoding/#varints>.

/// Maximum number of bytes for an encoded 64-bit varint.
///
/// Each byte contains 7 value bits, so we need 9 "full" bytes plus one bit
/// from the 10th byte.
pub const MAX_VARINT_LEN: usize = 10;

/// Maximum number of bytes for an encoded 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarintError {
    /// The input is empty.
    Eof,
    /// The end of the input was reached before the final byte of the varint.
    Truncated,
    /// The varint is longer than the maximum encoded length, or its value
    /// does not fit in the output type.
    Overflow,
}

/// Decode a varint of up to 64 bits from the start of `buf`.
///
/// Returns the value and the number of bytes it occupied. Value bits of the
/// 10th byte above bit 63 are discarded.
pub fn decode_varint64(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    if buf.is_empty() {
        return Err(VarintError::Eof);
    }

    let mut value = 0u64;
    for (i, byte) in buf.iter().copied().take(MAX_VARINT_LEN).enumerate() {
        // High bit is continuation bit. Low 7 bits are the payload. For
        // i == 9 the shift is 63, which keeps only the lowest payload bit.
        value |= ((byte & 0x7f) as u64) << (i * 7);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    if buf.len() < MAX_VARINT_LEN {
        Err(VarintError::Truncated)
    } else {
        Err(VarintError::Overflow)
    }
}

/// Decode a varint of up to 32 bits from the start of `buf`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode_varint32(buf: &[u8]) -> Result<(u32, usize), VarintError> {
    let Some(&first) = buf.first() else {
        return Err(VarintError::Eof);
    };

    // Single byte values are by far the most common (tags, short lengths).
    if first & 0x80 == 0 {
        return Ok((first as u32, 1));
    }

    let mut value = 0u32;
    for (i, byte) in buf.iter().copied().take(MAX_VARINT32_LEN).enumerate() {
        if i + 1 == MAX_VARINT32_LEN && byte > 0x0f {
            // Either the continuation bit is set or the payload has bits
            // above bit 31.
            return Err(VarintError::Overflow);
        }
        value |= ((byte & 0x7f) as u32) << (i * 7);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(VarintError::Truncated)
}

/// Decode a `sint32` value from its zigzag encoding.
pub fn zigzag_decode32(val: u32) -> i32 {
    ((val >> 1) as i32) ^ -((val & 1) as i32)
}

/// Decode a `sint64` value from its zigzag encoding.
pub fn zigzag_decode64(val: u64) -> i64 {
    ((val >> 1) as i64) ^ -((val & 1) as i64)
}

#[cfg(test)]
pub fn encode_varint(mut val: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAX_VARINT_LEN);
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        if val == 0 {
            bytes.push(byte);
            break;
        }
        bytes.push(byte | 0x80);
    }
    bytes
}

#[cfg(test)]
pub fn zigzag_encode64(val: i64) -> u64 {
    ((val << 1) ^ (val >> 63)) as u64
}

#[cfg(test)]
mod tests {
    use protowire_testing::TestCases;

    use super::{
        decode_varint32, decode_varint64, encode_varint, zigzag_decode32, zigzag_decode64,
        zigzag_encode64, VarintError,
    };

    #[test]
    fn test_decode_varint64() {
        let mut values: Vec<u64> = (0..1024).collect();
        values.extend([u32::MAX as u64, 1 << 35, 1 << 63, u64::MAX]);
        for val in values {
            let buf = encode_varint(val);
            assert_eq!(decode_varint64(&buf), Ok((val, buf.len())));
        }
    }

    #[test]
    fn test_decode_varint32() {
        let mut values: Vec<u32> = (0..1024).collect();
        values.extend([1 << 14, 1 << 21, 1 << 28, u32::MAX]);
        for val in values {
            let buf = encode_varint(val as u64);
            assert_eq!(decode_varint32(&buf), Ok((val, buf.len())));
        }
    }

    #[test]
    fn test_decode_examples() {
        #[derive(Debug)]
        struct Case {
            buf: &'static [u8],
            expected: u64,
            len: usize,
        }

        let cases = [
            // Example from https://protobuf.dev/programming-guides/encoding/#varints.
            Case {
                buf: &[0x96, 0x01],
                expected: 150,
                len: 2,
            },
            Case {
                buf: &[0xff, 0xff, 0xff, 0xff, 0x0f],
                expected: u32::MAX as u64,
                len: 5,
            },
            // Trailing bytes after the varint are not consumed.
            Case {
                buf: &[0x08, 0x96, 0x01],
                expected: 8,
                len: 1,
            },
            // Non-canonical encoding with a redundant zero group.
            Case {
                buf: &[0x81, 0x00],
                expected: 1,
                len: 2,
            },
        ];

        cases.test_each(|case| {
            assert_eq!(decode_varint64(case.buf), Ok((case.expected, case.len)));
            assert_eq!(
                decode_varint32(case.buf),
                Ok((case.expected as u32, case.len))
            );
        });
    }

    #[test]
    fn test_decode_errors() {
        #[derive(Debug)]
        struct Case {
            buf: Vec<u8>,
            varint32: VarintError,
            varint64: Option<VarintError>,
        }

        let cases = [
            Case {
                buf: Vec::new(),
                varint32: VarintError::Eof,
                varint64: Some(VarintError::Eof),
            },
            Case {
                buf: vec![0x96],
                varint32: VarintError::Truncated,
                varint64: Some(VarintError::Truncated),
            },
            // 2^32 fits in 64 bits but not 32.
            Case {
                buf: encode_varint(1 << 32),
                varint32: VarintError::Overflow,
                varint64: None,
            },
            // Negative int32 values are sign extended to 10 bytes.
            Case {
                buf: encode_varint(-1i64 as u64),
                varint32: VarintError::Overflow,
                varint64: None,
            },
            // 11 byte varint.
            Case {
                buf: [&[0x80u8; 10][..], &[0x01][..]].concat(),
                varint32: VarintError::Overflow,
                varint64: Some(VarintError::Overflow),
            },
        ];

        cases.test_each(|case| {
            assert_eq!(decode_varint32(&case.buf), Err(case.varint32));
            if let Some(err) = case.varint64 {
                assert_eq!(decode_varint64(&case.buf), Err(err));
            }
        });
    }

    #[test]
    fn test_decode_varint64_discards_excess_bits() {
        // The 10th byte can only contribute bit 63.
        let mut buf = encode_varint(u64::MAX);
        assert_eq!(buf.len(), 10);
        buf[9] = 0x7f;
        assert_eq!(decode_varint64(&buf), Ok((u64::MAX, 10)));
    }

    #[test]
    fn test_zigzag() {
        #[derive(Debug)]
        struct Case {
            encoded: u64,
            decoded: i64,
        }

        let cases = [
            Case {
                encoded: 0,
                decoded: 0,
            },
            Case {
                encoded: 1,
                decoded: -1,
            },
            Case {
                encoded: 2,
                decoded: 1,
            },
            Case {
                encoded: 3,
                decoded: -2,
            },
            Case {
                encoded: 0xfffffffe,
                decoded: i32::MAX as i64,
            },
            Case {
                encoded: 0xffffffff,
                decoded: i32::MIN as i64,
            },
        ];

        cases.test_each(|case| {
            assert_eq!(zigzag_decode64(case.encoded), case.decoded);
            assert_eq!(zigzag_decode32(case.encoded as u32), case.decoded as i32);
            assert_eq!(zigzag_encode64(case.decoded), case.encoded);
        });

        assert_eq!(zigzag_decode64(u64::MAX), i64::MIN);
        assert_eq!(zigzag_decode64(u64::MAX - 1), i64::MAX);
    }
}
