use std::fmt::{Display, Formatter};

use crate::errors::ErrorKind;

/// Physical encoding of a field value, stored in the low 3 bits of a tag.
///
/// See <https://protobuf.dev/programming-guides/encoding/#structure>.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WireType {
    /// Integer value encoded as a varint.
    Varint = 0,

    /// 8-byte little-endian value.
    Fixed64 = 1,

    /// Varint length followed by that many bytes.
    LengthDelimited = 2,

    /// Deprecated start-of-group marker.
    StartGroup = 3,

    /// Deprecated end-of-group marker.
    EndGroup = 4,

    /// 4-byte little-endian value.
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = ErrorKind;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        let wire_type = match val {
            0 => WireType::Varint,
            1 => WireType::Fixed64,
            2 => WireType::LengthDelimited,
            3 => WireType::StartGroup,
            4 => WireType::EndGroup,
            5 => WireType::Fixed32,
            _ => return Err(ErrorKind::InvalidWireType(val)),
        };
        Ok(wire_type)
    }
}

impl Display for WireType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start group",
            WireType::EndGroup => "end group",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

/// Field number and wire type decoded from the varint preceding each field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldTag {
    pub field_number: u32,
    pub wire_type: WireType,
}

impl FieldTag {
    pub fn new(field_number: u32, wire_type: WireType) -> Self {
        Self {
            field_number,
            wire_type,
        }
    }

    /// Split a raw tag value into field number and wire type.
    pub fn from_raw(tag: u32) -> Result<Self, ErrorKind> {
        let wire_type = WireType::try_from((tag & 0x7) as u8)?;
        Ok(Self {
            field_number: tag >> 3,
            wire_type,
        })
    }

    /// Return the raw tag value.
    ///
    /// Field numbers above `u32::MAX >> 3` don't fit and lose their high bits.
    pub fn to_raw(self) -> u32 {
        (self.field_number << 3) | self.wire_type as u32
    }
}
