//! Entry descriptor codec and the inline-payload rule.

use crate::layout::WORD_SIZE;
use devmeta_common::{DataType, MetaError, Result, TagId};

/// Number of payload bytes stored directly inside an entry descriptor.
pub const INLINE_PAYLOAD_SIZE: usize = 4;

/// Payload location for one entry.
///
/// Payloads of at most four bytes live inside the descriptor itself;
/// anything larger lives in the data heap at a word offset. The variant is
/// resolved by the single rule `byte_size <= 4`, never by an untagged
/// overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPayload {
    /// Value bytes stored in the descriptor's 4-byte payload slot.
    Inline([u8; INLINE_PAYLOAD_SIZE]),
    /// Word offset into the data heap.
    Offset(u32),
}

/// Fixed-size entry descriptor.
///
/// Layout (16 bytes, little-endian):
/// - item: 4 bytes
/// - data_type: 4 bytes
/// - count: 4 bytes
/// - payload: 4 bytes (inline value bytes or heap word offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemEntry {
    /// Item identifier.
    pub item: TagId,
    /// Element data type.
    pub data_type: DataType,
    /// Element count.
    pub count: u32,
    /// Inline value bytes or data heap word offset.
    pub payload: EntryPayload,
}

impl ItemEntry {
    /// Size of an entry descriptor in bytes.
    pub const SIZE: usize = 16;

    /// Returns the payload byte size for a type/count pair, failing on
    /// overflow rather than wrapping.
    pub fn payload_size(data_type: DataType, count: u32) -> Result<usize> {
        (count as usize)
            .checked_mul(data_type.element_size())
            .ok_or(MetaError::LayoutOverflow)
    }

    /// Returns true if a payload of the given byte size is stored inline.
    pub fn fits_inline(byte_size: usize) -> bool {
        byte_size <= INLINE_PAYLOAD_SIZE
    }

    /// Number of heap words occupied by an out-of-line payload of the
    /// given byte size.
    pub fn words_for(byte_size: usize) -> u32 {
        byte_size.div_ceil(WORD_SIZE) as u32
    }

    /// Returns this entry's payload size in bytes.
    pub fn byte_size(&self) -> usize {
        self.count as usize * self.data_type.element_size()
    }

    /// Number of heap words this entry occupies (0 for inline payloads).
    pub fn word_count(&self) -> u32 {
        match self.payload {
            EntryPayload::Inline(_) => 0,
            EntryPayload::Offset(_) => Self::words_for(self.byte_size()),
        }
    }

    /// Serializes the entry to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.item.0.to_le_bytes());
        buf[4..8].copy_from_slice(&(self.data_type as u32).to_le_bytes());
        buf[8..12].copy_from_slice(&self.count.to_le_bytes());
        match self.payload {
            EntryPayload::Inline(bytes) => buf[12..16].copy_from_slice(&bytes),
            EntryPayload::Offset(offset) => buf[12..16].copy_from_slice(&offset.to_le_bytes()),
        }
        buf
    }

    /// Deserializes an entry from bytes.
    ///
    /// The payload slot is interpreted per the inline rule derived from the
    /// decoded type and count. Fails on an unknown data type or an
    /// overflowing size.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let item = TagId(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]));
        let data_type = DataType::try_from(u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]))?;
        let count = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);

        let byte_size = Self::payload_size(data_type, count)?;
        let payload = if Self::fits_inline(byte_size) {
            EntryPayload::Inline([buf[12], buf[13], buf[14], buf[15]])
        } else {
            EntryPayload::Offset(u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]))
        };

        Ok(Self {
            item,
            data_type,
            count,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_inline_boundary() {
        assert!(ItemEntry::fits_inline(0));
        assert!(ItemEntry::fits_inline(4));
        assert!(!ItemEntry::fits_inline(5));
    }

    #[test]
    fn test_words_for() {
        assert_eq!(ItemEntry::words_for(1), 1);
        assert_eq!(ItemEntry::words_for(4), 1);
        assert_eq!(ItemEntry::words_for(5), 2);
        assert_eq!(ItemEntry::words_for(8), 2);
        assert_eq!(ItemEntry::words_for(9), 3);
    }

    #[test]
    fn test_payload_size() {
        assert_eq!(ItemEntry::payload_size(DataType::Byte, 3).unwrap(), 3);
        assert_eq!(ItemEntry::payload_size(DataType::Int32, 4).unwrap(), 16);
        assert_eq!(ItemEntry::payload_size(DataType::Rational, 2).unwrap(), 16);
    }

    #[test]
    fn test_payload_size_overflow() {
        let result = ItemEntry::payload_size(DataType::Double, u32::MAX);
        if usize::BITS <= 32 {
            assert!(matches!(result, Err(MetaError::LayoutOverflow)));
        } else {
            assert_eq!(result.unwrap(), u32::MAX as usize * 8);
        }
    }

    #[test]
    fn test_entry_roundtrip_inline() {
        let entry = ItemEntry {
            item: TagId(0x0001_0000),
            data_type: DataType::Int32,
            count: 1,
            payload: EntryPayload::Inline([7, 0, 0, 0]),
        };
        let bytes = entry.to_bytes();
        let recovered = ItemEntry::from_bytes(&bytes).unwrap();
        assert_eq!(recovered, entry);
    }

    #[test]
    fn test_entry_roundtrip_offset() {
        let entry = ItemEntry {
            item: TagId(0x0001_0002),
            data_type: DataType::Int32,
            count: 4,
            payload: EntryPayload::Offset(12),
        };
        let bytes = entry.to_bytes();
        let recovered = ItemEntry::from_bytes(&bytes).unwrap();
        assert_eq!(recovered, entry);
        assert_eq!(recovered.byte_size(), 16);
        assert_eq!(recovered.word_count(), 4);
    }

    #[test]
    fn test_entry_word_count_inline_is_zero() {
        let entry = ItemEntry {
            item: TagId(1),
            data_type: DataType::Byte,
            count: 4,
            payload: EntryPayload::Inline([1, 2, 3, 4]),
        };
        assert_eq!(entry.word_count(), 0);
    }

    #[test]
    fn test_entry_from_bytes_invalid_type() {
        let mut buf = [0u8; ItemEntry::SIZE];
        buf[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            ItemEntry::from_bytes(&buf),
            Err(MetaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_entry_payload_interpretation_follows_size() {
        // byte[4] payload slot holds value bytes, byte[5] holds an offset.
        let mut buf = [0u8; ItemEntry::SIZE];
        buf[0..4].copy_from_slice(&0x0002_0000u32.to_le_bytes());
        buf[8..12].copy_from_slice(&4u32.to_le_bytes());
        buf[12..16].copy_from_slice(&[9, 9, 9, 9]);
        let entry = ItemEntry::from_bytes(&buf).unwrap();
        assert!(matches!(entry.payload, EntryPayload::Inline(_)));

        buf[8..12].copy_from_slice(&5u32.to_le_bytes());
        buf[12..16].copy_from_slice(&3u32.to_le_bytes());
        let entry = ItemEntry::from_bytes(&buf).unwrap();
        assert_eq!(entry.payload, EntryPayload::Offset(3));
    }
}
