//! Item identifiers, element data types, and typed value vectors.

use crate::error::{MetaError, Result};
use serde::{Deserialize, Serialize};

/// 32-bit identifier naming a metadata field.
///
/// The high 16 bits encode the section; the low 16 bits encode the
/// tag index within that section.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TagId(pub u32);

impl TagId {
    /// Creates a TagId from a section and an index within that section.
    pub fn new(section: u16, index: u16) -> Self {
        Self(((section as u32) << 16) | (index as u32))
    }

    /// Returns the section encoded in the high 16 bits.
    pub fn section(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns the tag index within the section (low 16 bits).
    pub fn index(&self) -> u16 {
        self.0 as u16
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Element data types storable in a metadata buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum DataType {
    /// Unsigned 8-bit value.
    Byte = 0,
    /// Signed 32-bit integer.
    Int32 = 1,
    /// Unsigned 32-bit integer.
    UInt32 = 2,
    /// 32-bit IEEE float.
    Float = 3,
    /// Signed 64-bit integer.
    Int64 = 4,
    /// 64-bit IEEE double.
    Double = 5,
    /// 64-bit signed fraction.
    Rational = 6,
}

impl DataType {
    /// Returns the byte size of one element of this type.
    pub fn element_size(&self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::Int32 | DataType::UInt32 | DataType::Float => 4,
            DataType::Int64 | DataType::Double | DataType::Rational => 8,
        }
    }

    /// Returns the canonical lowercase name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Float => "float",
            DataType::Int64 => "int64",
            DataType::Double => "double",
            DataType::Rational => "rational",
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = MetaError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(DataType::Byte),
            1 => Ok(DataType::Int32),
            2 => Ok(DataType::UInt32),
            3 => Ok(DataType::Float),
            4 => Ok(DataType::Int64),
            5 => Ok(DataType::Double),
            6 => Ok(DataType::Rational),
            _ => Err(MetaError::InvalidParameter(format!(
                "unknown data type: {}",
                value
            ))),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 64-bit signed fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    /// Signed numerator.
    pub numerator: i32,
    /// Signed denominator.
    pub denominator: i32,
}

impl Rational {
    /// Encoded size in bytes (numerator + denominator).
    pub const SIZE: usize = 8;

    /// Creates a new rational.
    pub fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A typed vector of element values for one item.
///
/// The variant fixes the element type; the vector length is the element
/// count. Values cross the buffer boundary as little-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValues {
    Byte(Vec<u8>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Float(Vec<f32>),
    Int64(Vec<i64>),
    Double(Vec<f64>),
    Rational(Vec<Rational>),
}

impl TagValues {
    /// Returns the element data type of this value set.
    pub fn data_type(&self) -> DataType {
        match self {
            TagValues::Byte(_) => DataType::Byte,
            TagValues::Int32(_) => DataType::Int32,
            TagValues::UInt32(_) => DataType::UInt32,
            TagValues::Float(_) => DataType::Float,
            TagValues::Int64(_) => DataType::Int64,
            TagValues::Double(_) => DataType::Double,
            TagValues::Rational(_) => DataType::Rational,
        }
    }

    /// Returns the element count.
    pub fn count(&self) -> usize {
        match self {
            TagValues::Byte(v) => v.len(),
            TagValues::Int32(v) => v.len(),
            TagValues::UInt32(v) => v.len(),
            TagValues::Float(v) => v.len(),
            TagValues::Int64(v) => v.len(),
            TagValues::Double(v) => v.len(),
            TagValues::Rational(v) => v.len(),
        }
    }

    /// Returns the encoded payload size in bytes.
    pub fn byte_size(&self) -> usize {
        self.count() * self.data_type().element_size()
    }

    /// Encodes all elements to little-endian bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_size());
        match self {
            TagValues::Byte(v) => buf.extend_from_slice(v),
            TagValues::Int32(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            TagValues::UInt32(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            TagValues::Float(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            TagValues::Int64(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            TagValues::Double(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            TagValues::Rational(v) => {
                for x in v {
                    buf.extend_from_slice(&x.numerator.to_le_bytes());
                    buf.extend_from_slice(&x.denominator.to_le_bytes());
                }
            }
        }
        buf
    }

    /// Decodes `count` elements of `data_type` from little-endian bytes.
    pub fn decode(data_type: DataType, count: usize, buf: &[u8]) -> Result<Self> {
        let needed = count * data_type.element_size();
        if buf.len() < needed {
            return Err(MetaError::CorruptBuffer(format!(
                "payload truncated: need {} bytes, have {}",
                needed,
                buf.len()
            )));
        }

        let values = match data_type {
            DataType::Byte => TagValues::Byte(buf[..count].to_vec()),
            DataType::Int32 => TagValues::Int32(
                buf[..needed]
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DataType::UInt32 => TagValues::UInt32(
                buf[..needed]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DataType::Float => TagValues::Float(
                buf[..needed]
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DataType::Int64 => TagValues::Int64(
                buf[..needed]
                    .chunks_exact(8)
                    .map(|c| {
                        i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            ),
            DataType::Double => TagValues::Double(
                buf[..needed]
                    .chunks_exact(8)
                    .map(|c| {
                        f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            ),
            DataType::Rational => TagValues::Rational(
                buf[..needed]
                    .chunks_exact(8)
                    .map(|c| Rational {
                        numerator: i32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                        denominator: i32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                    })
                    .collect(),
            ),
        };
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_id_new() {
        let id = TagId::new(3, 7);
        assert_eq!(id.section(), 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.0, 0x0003_0007);
    }

    #[test]
    fn test_tag_id_section_extraction() {
        let id = TagId(0x8001_0004);
        assert_eq!(id.section(), 0x8001);
        assert_eq!(id.index(), 4);
    }

    #[test]
    fn test_tag_id_display() {
        assert_eq!(TagId(0x0001_0002).to_string(), "0x00010002");
        assert_eq!(TagId(0).to_string(), "0x00000000");
    }

    #[test]
    fn test_tag_id_ordering() {
        assert!(TagId(0x0001_0001) < TagId(0x0001_0002));
        assert!(TagId(0x0001_0002) < TagId(0x0002_0000));
    }

    #[test]
    fn test_data_type_element_sizes() {
        assert_eq!(DataType::Byte.element_size(), 1);
        assert_eq!(DataType::Int32.element_size(), 4);
        assert_eq!(DataType::UInt32.element_size(), 4);
        assert_eq!(DataType::Float.element_size(), 4);
        assert_eq!(DataType::Int64.element_size(), 8);
        assert_eq!(DataType::Double.element_size(), 8);
        assert_eq!(DataType::Rational.element_size(), 8);
    }

    #[test]
    fn test_data_type_try_from() {
        for raw in 0..7u32 {
            let data_type = DataType::try_from(raw).unwrap();
            assert_eq!(data_type as u32, raw);
        }
        assert!(DataType::try_from(7).is_err());
        assert!(DataType::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::Byte.to_string(), "byte");
        assert_eq!(DataType::Rational.to_string(), "rational");
    }

    #[test]
    fn test_rational_display() {
        assert_eq!(Rational::new(1, 3).to_string(), "1/3");
        assert_eq!(Rational::new(-2, 5).to_string(), "-2/5");
    }

    #[test]
    fn test_tag_values_metadata() {
        let values = TagValues::Int32(vec![1, 2, 3]);
        assert_eq!(values.data_type(), DataType::Int32);
        assert_eq!(values.count(), 3);
        assert_eq!(values.byte_size(), 12);

        let values = TagValues::Byte(vec![0xAA; 5]);
        assert_eq!(values.byte_size(), 5);

        let values = TagValues::Rational(vec![Rational::new(1, 2)]);
        assert_eq!(values.byte_size(), 8);
    }

    #[test]
    fn test_tag_values_encode_int32() {
        let values = TagValues::Int32(vec![1, -1]);
        assert_eq!(
            values.encode(),
            vec![0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_tag_values_encode_rational() {
        let values = TagValues::Rational(vec![Rational::new(1, 2)]);
        assert_eq!(
            values.encode(),
            vec![0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_tag_values_roundtrip_all_types() {
        let cases = vec![
            TagValues::Byte(vec![1, 2, 3, 4, 5]),
            TagValues::Int32(vec![i32::MIN, 0, i32::MAX]),
            TagValues::UInt32(vec![0, u32::MAX]),
            TagValues::Float(vec![1.5, -0.25]),
            TagValues::Int64(vec![i64::MIN, i64::MAX]),
            TagValues::Double(vec![std::f64::consts::PI]),
            TagValues::Rational(vec![Rational::new(30, 1), Rational::new(-1, 3)]),
        ];

        for values in cases {
            let encoded = values.encode();
            assert_eq!(encoded.len(), values.byte_size());
            let decoded =
                TagValues::decode(values.data_type(), values.count(), &encoded).unwrap();
            assert_eq!(decoded, values);
        }
    }

    #[test]
    fn test_tag_values_decode_truncated() {
        let result = TagValues::decode(DataType::Int32, 2, &[0u8; 7]);
        assert!(matches!(result, Err(MetaError::CorruptBuffer(_))));
    }

    #[test]
    fn test_tag_values_decode_ignores_trailing_bytes() {
        // Heap words are zero-padded; decode must read exactly count elements.
        let decoded = TagValues::decode(DataType::Byte, 5, &[1, 2, 3, 4, 5, 0, 0, 0]).unwrap();
        assert_eq!(decoded, TagValues::Byte(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_tag_id_serde_roundtrip() {
        let original = TagId(0x0004_0002);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: TagId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_data_type_serde_roundtrip() {
        for data_type in [
            DataType::Byte,
            DataType::Int32,
            DataType::UInt32,
            DataType::Float,
            DataType::Int64,
            DataType::Double,
            DataType::Rational,
        ] {
            let serialized = serde_json::to_string(&data_type).unwrap();
            let deserialized: DataType = serde_json::from_str(&serialized).unwrap();
            assert_eq!(data_type, deserialized);
        }
    }
}
