//! Buffer layout computation and the 32-byte header codec.
//!
//! Buffer layout:
//! ```text
//! +----------------------+
//! | Header (32)          |
//! +----------------------+
//! | Entry index          |  <- item_capacity x 16-byte entries, 4-byte aligned
//! +----------------------+
//! | Data heap            |  <- data_word_capacity x 4-byte words, 8-byte aligned
//! +----------------------+
//! ```
//!
//! All header fields and offsets are little-endian and buffer-relative, so
//! the whole buffer can be relocated as an opaque block.

use crate::entry::ItemEntry;
use devmeta_common::{MetaError, Result};

/// Current metadata buffer format version.
pub const METADATA_VERSION: u32 = 1;

/// Size of one data heap word in bytes.
pub const WORD_SIZE: usize = 4;

/// Required alignment of the entry index region.
pub const ITEM_ALIGNMENT: usize = 4;

/// Required alignment of the data heap region.
pub const DATA_ALIGNMENT: usize = 8;

/// Rounds `offset` up to the next multiple of `alignment` (a power of two).
pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

/// Computed byte offsets and total size for a capacity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    /// Byte offset of the entry index region.
    pub items_start: usize,
    /// Byte offset of the data heap region.
    pub data_start: usize,
    /// Total buffer size in bytes.
    pub size: usize,
}

impl BufferLayout {
    /// Computes region offsets and total size for the given capacities.
    ///
    /// All arithmetic is checked; an overflowing size computation fails
    /// with `LayoutOverflow` instead of wrapping. The total size must also
    /// fit the u32 `size` header field.
    pub fn compute(item_capacity: u32, data_word_capacity: u32) -> Result<Self> {
        let items_start = align_up(MetadataHeader::SIZE, ITEM_ALIGNMENT);

        let items_size = (item_capacity as usize)
            .checked_mul(ItemEntry::SIZE)
            .ok_or(MetaError::LayoutOverflow)?;
        let items_end = items_start
            .checked_add(items_size)
            .ok_or(MetaError::LayoutOverflow)?;
        let data_start = items_end
            .checked_add(DATA_ALIGNMENT - 1)
            .ok_or(MetaError::LayoutOverflow)?
            & !(DATA_ALIGNMENT - 1);

        let data_size = (data_word_capacity as usize)
            .checked_mul(WORD_SIZE)
            .ok_or(MetaError::LayoutOverflow)?;
        let size = data_start
            .checked_add(data_size)
            .ok_or(MetaError::LayoutOverflow)?;

        if size > u32::MAX as usize {
            return Err(MetaError::LayoutOverflow);
        }

        Ok(Self {
            items_start,
            data_start,
            size,
        })
    }
}

/// Header at the beginning of every metadata buffer.
///
/// Layout (32 bytes, all fields little-endian u32):
/// - version
/// - size (total buffer bytes)
/// - item_count
/// - item_capacity
/// - items_start (buffer-relative byte offset)
/// - data_count (heap words in use)
/// - data_capacity (heap words total)
/// - data_start (buffer-relative byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataHeader {
    pub version: u32,
    pub size: u32,
    pub item_count: u32,
    pub item_capacity: u32,
    pub items_start: u32,
    pub data_count: u32,
    pub data_capacity: u32,
    pub data_start: u32,
}

impl MetadataHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 32;

    /// Creates a header for a freshly laid-out, empty buffer.
    pub fn new(layout: &BufferLayout, item_capacity: u32, data_word_capacity: u32) -> Self {
        Self {
            version: METADATA_VERSION,
            size: layout.size as u32,
            item_count: 0,
            item_capacity,
            items_start: layout.items_start as u32,
            data_count: 0,
            data_capacity: data_word_capacity,
            data_start: layout.data_start as u32,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.item_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.item_capacity.to_le_bytes());
        buf[16..20].copy_from_slice(&self.items_start.to_le_bytes());
        buf[20..24].copy_from_slice(&self.data_count.to_le_bytes());
        buf[24..28].copy_from_slice(&self.data_capacity.to_le_bytes());
        buf[28..32].copy_from_slice(&self.data_start.to_le_bytes());
        buf
    }

    /// Deserializes the header from bytes.
    pub fn from_bytes(buf: &[u8]) -> Self {
        let read = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        Self {
            version: read(0),
            size: read(4),
            item_count: read(8),
            item_capacity: read(12),
            items_start: read(16),
            data_count: read(20),
            data_capacity: read(24),
            data_start: read(28),
        }
    }
}
