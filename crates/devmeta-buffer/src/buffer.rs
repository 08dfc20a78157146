//! The metadata buffer: allocation, placement, lookup, and mutation.

use bytes::{Bytes, BytesMut};
use devmeta_common::{DataType, MetaError, MetadataConfig, Result, TagId, TagValues};

use crate::entry::{EntryPayload, ItemEntry};
use crate::layout::{BufferLayout, MetadataHeader, METADATA_VERSION, WORD_SIZE};
use crate::registry::TagRegistry;

/// A self-describing, flat, relocatable metadata buffer.
///
/// The buffer is a single contiguous byte region: a 32-byte header, an
/// entry index kept strictly sorted ascending by item identifier, and an
/// append-oriented data heap for payloads larger than four bytes. All
/// offsets recorded in the buffer are buffer-relative, so the raw bytes can
/// cross a process or device boundary and be reinterpreted in place.
///
/// Mutation requires `&mut self`; callers needing cross-thread mutation
/// must supply their own exclusion.
pub struct MetadataBuffer {
    data: BytesMut,
}

/// Decoded view of one stored item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    /// Position in the entry index.
    pub index: u32,
    /// Item identifier.
    pub item: TagId,
    /// Element data type.
    pub data_type: DataType,
    /// Element count.
    pub count: u32,
    /// Decoded element values.
    pub values: TagValues,
}

impl MetadataBuffer {
    // =========================================================================
    // Construction and release
    // =========================================================================

    /// Allocates a fresh, empty buffer with the given capacities.
    pub fn allocate(item_capacity: u32, data_word_capacity: u32) -> Result<Self> {
        let layout = BufferLayout::compute(item_capacity, data_word_capacity)?;
        let mut data = BytesMut::zeroed(layout.size);
        let header = MetadataHeader::new(&layout, item_capacity, data_word_capacity);
        data[..MetadataHeader::SIZE].copy_from_slice(&header.to_bytes());
        Ok(Self { data })
    }

    /// Allocates a buffer using the capacities from a config.
    pub fn with_config(config: &MetadataConfig) -> Result<Self> {
        Self::allocate(config.item_capacity, config.data_word_capacity)
    }

    /// Initializes a buffer over an externally allocated block.
    ///
    /// The block length must exactly match the size computed for the
    /// capacity pair, else `SizeMismatch`. The block contents are
    /// overwritten.
    pub fn wrap(mut block: BytesMut, item_capacity: u32, data_word_capacity: u32) -> Result<Self> {
        let layout = BufferLayout::compute(item_capacity, data_word_capacity)?;
        if block.len() != layout.size {
            return Err(MetaError::SizeMismatch {
                expected: layout.size,
                actual: block.len(),
            });
        }
        block.fill(0);
        let header = MetadataHeader::new(&layout, item_capacity, data_word_capacity);
        block[..MetadataHeader::SIZE].copy_from_slice(&header.to_bytes());
        Ok(Self { data: block })
    }

    /// Reconstructs a buffer from bytes received over a transport.
    ///
    /// Validates the header and entry index against every structural
    /// invariant before accepting the block: version, recorded size,
    /// recomputed region offsets, counts against capacities, strict
    /// ascending entry order, decodable entry types, and out-of-line spans
    /// inside the used portion of the heap.
    pub fn from_raw(block: BytesMut) -> Result<Self> {
        if block.len() < MetadataHeader::SIZE {
            return Err(MetaError::CorruptBuffer(format!(
                "block too short for header: {} bytes",
                block.len()
            )));
        }
        let header = MetadataHeader::from_bytes(&block[..MetadataHeader::SIZE]);
        if header.version != METADATA_VERSION {
            return Err(MetaError::CorruptBuffer(format!(
                "unsupported version {}",
                header.version
            )));
        }
        if header.size as usize != block.len() {
            return Err(MetaError::CorruptBuffer(format!(
                "recorded size {} != block length {}",
                header.size,
                block.len()
            )));
        }

        let layout = BufferLayout::compute(header.item_capacity, header.data_capacity)?;
        if layout.size != block.len()
            || layout.items_start != header.items_start as usize
            || layout.data_start != header.data_start as usize
        {
            return Err(MetaError::CorruptBuffer(
                "recorded offsets do not match capacities".to_string(),
            ));
        }
        if header.item_count > header.item_capacity {
            return Err(MetaError::CorruptBuffer(format!(
                "item count {} exceeds capacity {}",
                header.item_count, header.item_capacity
            )));
        }
        if header.data_count > header.data_capacity {
            return Err(MetaError::CorruptBuffer(format!(
                "data word count {} exceeds capacity {}",
                header.data_count, header.data_capacity
            )));
        }

        let buffer = Self { data: block };
        let mut previous: Option<TagId> = None;
        for index in 0..header.item_count {
            let entry = buffer
                .entry_at_unchecked(index)
                .map_err(|e| MetaError::CorruptBuffer(format!("entry {}: {}", index, e)))?;
            if let Some(prev) = previous {
                if entry.item <= prev {
                    return Err(MetaError::CorruptBuffer(
                        "entry index not strictly sorted".to_string(),
                    ));
                }
            }
            previous = Some(entry.item);

            if let EntryPayload::Offset(offset) = entry.payload {
                let end = offset
                    .checked_add(entry.word_count())
                    .ok_or_else(|| MetaError::CorruptBuffer("payload span overflow".to_string()))?;
                if end > header.data_count {
                    return Err(MetaError::CorruptBuffer(format!(
                        "entry {} payload [{}, {}) outside used heap ({} words)",
                        index, offset, end, header.data_count
                    )));
                }
            }
        }
        Ok(buffer)
    }

    /// Returns the raw bytes of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer into an opaque, relocatable byte block.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    // =========================================================================
    // Header accessors
    // =========================================================================

    fn header(&self) -> MetadataHeader {
        MetadataHeader::from_bytes(&self.data[..MetadataHeader::SIZE])
    }

    fn set_header(&mut self, header: MetadataHeader) {
        self.data[..MetadataHeader::SIZE].copy_from_slice(&header.to_bytes());
    }

    /// Buffer format version.
    pub fn version(&self) -> u32 {
        self.header().version
    }

    /// Total buffer size in bytes.
    pub fn size(&self) -> usize {
        self.header().size as usize
    }

    /// Number of live entries.
    pub fn item_count(&self) -> u32 {
        self.header().item_count
    }

    /// Entry capacity.
    pub fn item_capacity(&self) -> u32 {
        self.header().item_capacity
    }

    /// Data heap words in use (including dead words).
    pub fn data_word_count(&self) -> u32 {
        self.header().data_count
    }

    /// Data heap capacity in words.
    pub fn data_word_capacity(&self) -> u32 {
        self.header().data_capacity
    }

    /// Returns true if the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    // =========================================================================
    // Entry index
    // =========================================================================

    fn entry_offset(&self, index: u32) -> usize {
        self.header().items_start as usize + index as usize * ItemEntry::SIZE
    }

    /// Reads the item identifier of the entry at `index` without decoding
    /// the full descriptor.
    fn item_at(&self, index: u32) -> TagId {
        let offset = self.entry_offset(index);
        TagId(u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]))
    }

    fn entry_at_unchecked(&self, index: u32) -> Result<ItemEntry> {
        let offset = self.entry_offset(index);
        ItemEntry::from_bytes(&self.data[offset..offset + ItemEntry::SIZE])
    }

    /// Returns the entry descriptor at `index`, bounds-checked.
    pub fn entry_at(&self, index: u32) -> Result<ItemEntry> {
        let count = self.item_count();
        if index >= count {
            return Err(MetaError::IndexOutOfRange { index, count });
        }
        self.entry_at_unchecked(index)
    }

    fn write_entry(&mut self, index: u32, entry: &ItemEntry) {
        let offset = self.entry_offset(index);
        self.data[offset..offset + ItemEntry::SIZE].copy_from_slice(&entry.to_bytes());
    }

    /// First index whose item identifier is >= `item`.
    fn lower_bound(&self, item: TagId) -> u32 {
        let mut lo = 0u32;
        let mut hi = self.item_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.item_at(mid) < item {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Binary search for an item over the sorted entry index.
    pub fn find(&self, item: TagId) -> Option<u32> {
        let index = self.lower_bound(item);
        if index < self.item_count() && self.item_at(index) == item {
            Some(index)
        } else {
            None
        }
    }

    /// Returns true if an entry with the given identifier is present.
    pub fn contains(&self, item: TagId) -> bool {
        self.find(item).is_some()
    }

    /// Inserts an entry at its sorted position, shifting the suffix right.
    ///
    /// The caller guarantees the identifier is not already present.
    pub(crate) fn insert_entry(&mut self, entry: ItemEntry) -> Result<u32> {
        let mut header = self.header();
        if header.item_count >= header.item_capacity {
            return Err(MetaError::ItemCapacityExceeded {
                capacity: header.item_capacity,
            });
        }

        let index = self.lower_bound(entry.item);
        let start = self.entry_offset(index);
        let end = self.entry_offset(header.item_count);
        self.data.copy_within(start..end, start + ItemEntry::SIZE);
        self.write_entry(index, &entry);

        header.item_count += 1;
        self.set_header(header);
        Ok(index)
    }

    /// Removes the entry at `index`, shifting the suffix left.
    ///
    /// Heap words referenced by the entry are not touched; they become dead
    /// space until a compaction pass.
    fn remove_entry(&mut self, index: u32) {
        let mut header = self.header();
        let start = self.entry_offset(index + 1);
        let end = self.entry_offset(header.item_count);
        let dest = self.entry_offset(index);
        self.data.copy_within(start..end, dest);

        let vacated = self.entry_offset(header.item_count - 1);
        self.data[vacated..vacated + ItemEntry::SIZE].fill(0);

        header.item_count -= 1;
        self.set_header(header);
    }

    /// Iterates over live entries in index order.
    pub fn iter(&self) -> EntryIter<'_> {
        EntryIter {
            buffer: self,
            index: 0,
        }
    }

    // =========================================================================
    // Data heap
    // =========================================================================

    fn payload_offset(&self, word_offset: u32) -> usize {
        self.header().data_start as usize + word_offset as usize * WORD_SIZE
    }

    /// Reads `len` payload bytes starting at a heap word offset.
    pub(crate) fn read_payload(&self, word_offset: u32, len: usize) -> &[u8] {
        let start = self.payload_offset(word_offset);
        &self.data[start..start + len]
    }

    /// Appends a payload at the current heap end, returning its word offset.
    ///
    /// Fails with `DataCapacityExceeded` before any write; counts are
    /// unchanged on failure.
    pub(crate) fn append_payload(&mut self, bytes: &[u8]) -> Result<u32> {
        let words = ItemEntry::words_for(bytes.len());
        let mut header = self.header();
        let new_count = header
            .data_count
            .checked_add(words)
            .ok_or(MetaError::LayoutOverflow)?;
        if new_count > header.data_capacity {
            return Err(MetaError::DataCapacityExceeded {
                needed: words,
                capacity: header.data_capacity,
            });
        }

        let offset = header.data_count;
        self.write_payload_at(offset, bytes);
        header.data_count = new_count;
        self.set_header(header);
        Ok(offset)
    }

    /// Overwrites payload bytes at an existing word offset, zero-padding
    /// to the word boundary.
    fn write_payload_at(&mut self, word_offset: u32, bytes: &[u8]) {
        let start = self.payload_offset(word_offset);
        let padded = ItemEntry::words_for(bytes.len()) as usize * WORD_SIZE;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        self.data[start + bytes.len()..start + padded].fill(0);
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Validates a value set against the registry's declaration for `item`.
    fn validate_values(
        &self,
        registry: &TagRegistry,
        item: TagId,
        values: &TagValues,
    ) -> Result<()> {
        if values.count() == 0 {
            return Err(MetaError::InvalidParameter(
                "element count must be non-zero".to_string(),
            ));
        }
        if values.count() > u32::MAX as usize {
            return Err(MetaError::InvalidParameter(format!(
                "element count {} exceeds u32 range",
                values.count()
            )));
        }
        let declared = registry.declared_type_of(item).ok_or_else(|| {
            MetaError::InvalidParameter(format!("unknown item {}", item))
        })?;
        if declared != values.data_type() {
            return Err(MetaError::TypeMismatch {
                item,
                expected: declared,
                actual: values.data_type(),
            });
        }
        Ok(())
    }

    /// Adds a new item, returning its position in the entry index.
    ///
    /// Fails with `DuplicateItem` if the identifier is already present
    /// (use [`update`](Self::update) instead). Capacity failures are
    /// detected before any write, so a failed add never leaves a partial
    /// mutation visible.
    pub fn add(&mut self, registry: &TagRegistry, item: TagId, values: &TagValues) -> Result<u32> {
        self.validate_values(registry, item, values)?;
        if self.contains(item) {
            return Err(MetaError::DuplicateItem(item));
        }
        // Entry capacity is checked before a possible heap append so the
        // add is all-or-nothing.
        if self.item_count() >= self.item_capacity() {
            return Err(MetaError::ItemCapacityExceeded {
                capacity: self.item_capacity(),
            });
        }

        let entry = self.build_entry(item, values, None)?;
        self.insert_entry(entry)
    }

    /// Updates the item with the given identifier, returning its index.
    pub fn update(
        &mut self,
        registry: &TagRegistry,
        item: TagId,
        values: &TagValues,
    ) -> Result<u32> {
        let index = self.find(item).ok_or(MetaError::ItemNotFound(item))?;
        self.update_at(registry, index, values)?;
        Ok(index)
    }

    /// Updates the entry at `index` with a new value set.
    ///
    /// Inline-fitting payloads are written directly into the descriptor. An
    /// out-of-line payload that shrinks (or stays equal in words) is
    /// overwritten in place at its existing offset; growth appends a fresh
    /// region at the heap end and the old words become dead until
    /// compaction.
    pub fn update_at(
        &mut self,
        registry: &TagRegistry,
        index: u32,
        values: &TagValues,
    ) -> Result<()> {
        let old = self.entry_at(index)?;
        self.validate_values(registry, old.item, values)?;
        let entry = self.build_entry(old.item, values, Some(&old))?;
        self.write_entry(index, &entry);
        Ok(())
    }

    /// Builds the descriptor for a value set, storing the payload.
    ///
    /// `old` carries the entry being replaced, enabling in-place reuse of
    /// its heap allocation when the new payload fits.
    fn build_entry(
        &mut self,
        item: TagId,
        values: &TagValues,
        old: Option<&ItemEntry>,
    ) -> Result<ItemEntry> {
        let byte_size = values.byte_size();
        let payload = if ItemEntry::fits_inline(byte_size) {
            let mut inline = [0u8; 4];
            inline[..byte_size].copy_from_slice(&values.encode());
            EntryPayload::Inline(inline)
        } else {
            let new_words = ItemEntry::words_for(byte_size);
            let reusable = old.and_then(|entry| match entry.payload {
                EntryPayload::Offset(offset) if new_words <= entry.word_count() => Some(offset),
                _ => None,
            });
            match reusable {
                Some(offset) => {
                    self.write_payload_at(offset, &values.encode());
                    EntryPayload::Offset(offset)
                }
                None => EntryPayload::Offset(self.append_payload(&values.encode())?),
            }
        };

        Ok(ItemEntry {
            item,
            data_type: values.data_type(),
            count: values.count() as u32,
            payload,
        })
    }

    /// Deletes the item with the given identifier.
    pub fn delete(&mut self, item: TagId) -> Result<()> {
        let index = self.find(item).ok_or(MetaError::ItemNotFound(item))?;
        self.remove_entry(index);
        Ok(())
    }

    /// Deletes the entry at `index`.
    pub fn delete_at(&mut self, index: u32) -> Result<()> {
        let count = self.item_count();
        if index >= count {
            return Err(MetaError::IndexOutOfRange { index, count });
        }
        self.remove_entry(index);
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Looks up an item by identifier and decodes its values.
    pub fn get(&self, item: TagId) -> Result<ItemView> {
        let index = self.find(item).ok_or(MetaError::ItemNotFound(item))?;
        self.get_at(index)
    }

    /// Decodes the entry at `index`.
    pub fn get_at(&self, index: u32) -> Result<ItemView> {
        let entry = self.entry_at(index)?;
        let byte_size = entry.byte_size();
        let values = match entry.payload {
            EntryPayload::Inline(bytes) => {
                TagValues::decode(entry.data_type, entry.count as usize, &bytes[..byte_size])?
            }
            EntryPayload::Offset(offset) => TagValues::decode(
                entry.data_type,
                entry.count as usize,
                self.read_payload(offset, byte_size),
            )?,
        };
        Ok(ItemView {
            index,
            item: entry.item,
            data_type: entry.data_type,
            count: entry.count,
            values,
        })
    }
}

impl std::fmt::Debug for MetadataBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataBuffer")
            .field("size", &self.size())
            .field("item_count", &self.item_count())
            .field("item_capacity", &self.item_capacity())
            .field("data_word_count", &self.data_word_count())
            .field("data_word_capacity", &self.data_word_capacity())
            .finish()
    }
}

/// Iterator over decoded entries in index order.
///
/// Entries that fail to decode are skipped; a buffer built or validated
/// through this crate's constructors has none.
pub struct EntryIter<'a> {
    buffer: &'a MetadataBuffer,
    index: u32,
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = ItemView;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.buffer.item_count() {
            let index = self.index;
            self.index += 1;
            if let Ok(view) = self.buffer.get_at(index) {
                return Some(view);
            }
        }
        None
    }
}
