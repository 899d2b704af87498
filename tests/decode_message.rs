use protowire::{DecodeError, DecodeOptions, Decoder, ErrorKind, SkipPolicy, WireType};
use protowire_testing::TestCases;
use rayon::prelude::*;

/// Minimal encoder used to produce test messages.
#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn varint(&mut self, mut val: u64) -> &mut Self {
        while val > 0x7f {
            self.buf.push((val as u8 & 0x7f) | 0x80);
            val >>= 7;
        }
        self.buf.push(val as u8);
        self
    }

    fn tag(&mut self, number: u32, wire_type: WireType) -> &mut Self {
        self.varint(((number as u64) << 3) | wire_type as u64)
    }

    fn bytes(&mut self, number: u32, bytes: &[u8]) -> &mut Self {
        self.tag(number, WireType::LengthDelimited)
            .varint(bytes.len() as u64);
        self.buf.extend(bytes);
        self
    }

    fn fixed32(&mut self, number: u32, val: u32) -> &mut Self {
        self.tag(number, WireType::Fixed32);
        self.buf.extend(val.to_le_bytes());
        self
    }

    fn fixed64(&mut self, number: u32, val: u64) -> &mut Self {
        self.tag(number, WireType::Fixed64);
        self.buf.extend(val.to_le_bytes());
        self
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Decoded form of:
///
/// ```proto
/// message Tensor {
///   string name = 1;
///   repeated int64 dims = 2;
///   float scale = 3;
///   bytes raw_data = 4;
///   Location location = 5;
/// }
///
/// message Location {
///   uint64 offset = 1;
///   double checksum = 2;
/// }
/// ```
#[derive(Debug, Default, PartialEq)]
struct Tensor<'a> {
    name: &'a [u8],
    dims: Vec<i64>,
    scale: f32,
    raw_data: &'a [u8],
    location: Option<Location>,
}

#[derive(Debug, Default, PartialEq)]
struct Location {
    offset: u64,
    checksum: f64,
}

impl<'a> Tensor<'a> {
    const NAME: u32 = 1;
    const DIMS: u32 = 2;
    const SCALE: u32 = 3;
    const RAW_DATA: u32 = 4;
    const LOCATION: u32 = 5;

    fn decode(decoder: &mut Decoder<'a>) -> Result<Self, DecodeError> {
        let mut tensor = Tensor::default();
        for field in decoder.fields() {
            let field = field?;
            match field.number() {
                Self::NAME => tensor.name = field.get_bytes()?,
                Self::DIMS => {
                    for dim in field.get_repeated_int64()? {
                        tensor.dims.push(dim?);
                    }
                }
                Self::SCALE => tensor.scale = field.get_float()?,
                Self::RAW_DATA => tensor.raw_data = field.get_bytes()?,
                Self::LOCATION => {
                    tensor.location = Some(Location::decode(&mut field.get_message()?)?)
                }
                // Unknown fields have already been read past by `fields`.
                _ => {}
            }
        }
        Ok(tensor)
    }
}

impl Location {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let mut location = Location::default();
        while !decoder.is_at_end() {
            let tag = decoder.read_tag()?;
            match (tag.field_number, tag.wire_type) {
                (1, WireType::Varint) => location.offset = decoder.read_varint64()?,
                (2, WireType::Fixed64) => location.checksum = decoder.read_double()?,
                _ => decoder.skip(tag.wire_type)?,
            }
        }
        Ok(location)
    }
}

fn encode_tensor(name: &str, dims: &[i64], unknown_fields: bool) -> Vec<u8> {
    let location = Writer::default()
        .tag(1, WireType::Varint)
        .varint(4096)
        .fixed32(15, 0xdeadbeef)
        .fixed64(2, 0.5f64.to_bits())
        .finish();

    let mut packed_dims = Writer::default();
    for &dim in &dims[1..] {
        packed_dims.varint(dim as u64);
    }
    let packed_dims = packed_dims.finish();

    let mut writer = Writer::default();
    writer.bytes(Tensor::NAME, name.as_bytes());
    if unknown_fields {
        writer
            .bytes(100, b"doc string")
            .tag(101, WireType::Varint)
            .varint(u64::MAX)
            .fixed64(102, 7);
    }
    writer
        .tag(Tensor::DIMS, WireType::Varint)
        .varint(dims[0] as u64)
        .bytes(Tensor::DIMS, &packed_dims)
        .fixed32(Tensor::SCALE, 0.25f32.to_bits())
        .bytes(Tensor::RAW_DATA, &[1, 2, 3, 4])
        .bytes(Tensor::LOCATION, &location)
        .finish()
}

#[test]
fn test_decode_message() {
    #[derive(Debug)]
    struct Case {
        unknown_fields: bool,
    }

    let cases = [
        Case {
            unknown_fields: false,
        },
        Case {
            unknown_fields: true,
        },
    ];

    cases.test_each(|case| {
        let buf = encode_tensor("weight", &[3, -1, 224], case.unknown_fields);
        let mut decoder = Decoder::new(&buf);
        let tensor = Tensor::decode(&mut decoder).unwrap();

        assert_eq!(
            tensor,
            Tensor {
                name: b"weight",
                dims: vec![3, -1, 224],
                scale: 0.25,
                raw_data: &[1, 2, 3, 4],
                location: Some(Location {
                    offset: 4096,
                    checksum: 0.5,
                }),
            }
        );
        assert!(decoder.is_at_end());
    });
}

#[test]
fn test_decode_truncated_message() {
    let buf = encode_tensor("weight", &[3, 224], true);

    // Every strict prefix of the message either fails to decode or decodes
    // fewer fields. None of them may panic.
    for len in 0..buf.len() {
        let mut decoder = Decoder::new(&buf[..len]);
        match Tensor::decode(&mut decoder) {
            Ok(tensor) => assert!(tensor.location.is_none()),
            Err(err) => {
                assert!(matches!(
                    err.kind(),
                    ErrorKind::OutOfBounds { .. } | ErrorKind::MalformedVarint
                ));
                assert!(decoder.position() <= len);
            }
        }
    }
}

#[test]
fn test_decode_group_fields() {
    let buf = Writer::default()
        .bytes(Tensor::NAME, b"grouped")
        .tag(50, WireType::StartGroup)
        .tag(50, WireType::EndGroup)
        .fixed32(Tensor::SCALE, 2.0f32.to_bits())
        .finish();

    let mut decoder = Decoder::new(&buf);
    let err = Tensor::decode(&mut decoder).err().unwrap();
    assert_eq!(
        err.kind(),
        &ErrorKind::UnsupportedWireType(WireType::StartGroup)
    );
    assert_eq!(err.field(), Some(50));

    let opts = DecodeOptions::default().with_skip_policy(SkipPolicy::Permissive);
    let mut decoder = Decoder::with_options(&buf, opts);
    let tensor = Tensor::decode(&mut decoder).unwrap();
    assert_eq!(tensor.name, b"grouped");
    assert_eq!(tensor.scale, 2.0);
}

#[test]
fn test_parallel_decoders_are_independent() {
    let buffers: Vec<Vec<u8>> = (0..256)
        .map(|i| encode_tensor(&format!("tensor_{}", i), &[i, i * 2, -i], i % 2 == 0))
        .collect();

    let dims: Vec<Vec<i64>> = buffers
        .par_iter()
        .map(|buf| {
            let mut decoder = Decoder::new(buf);
            let tensor = Tensor::decode(&mut decoder).unwrap();
            assert!(decoder.is_at_end());
            tensor.dims
        })
        .collect();

    for (i, dims) in dims.into_iter().enumerate() {
        let i = i as i64;
        assert_eq!(dims, [i, i * 2, -i]);
    }
}
