//! Buffer compaction: rebuilds a buffer with a tightly packed data heap.

use devmeta_common::{MetaError, Result};

use crate::buffer::MetadataBuffer;
use crate::entry::{EntryPayload, ItemEntry};

/// Copies every live entry of `source` into a freshly laid-out buffer.
///
/// Out-of-line payloads are re-packed contiguously from the start of the
/// destination heap, eliminating words orphaned by deletes and growing
/// updates. The requested capacities must cover the source's live usage.
/// This is the only operation that reclaims heap space and the standard
/// path to grow a buffer: allocate bigger, compact into it, release the
/// source.
pub fn compact(
    source: &MetadataBuffer,
    item_capacity: u32,
    data_word_capacity: u32,
) -> Result<MetadataBuffer> {
    let live_items = source.item_count();
    if item_capacity < live_items {
        return Err(MetaError::ItemCapacityExceeded {
            capacity: item_capacity,
        });
    }

    let mut live_words: u32 = 0;
    for index in 0..live_items {
        live_words = live_words
            .checked_add(source.entry_at(index)?.word_count())
            .ok_or(MetaError::LayoutOverflow)?;
    }
    if data_word_capacity < live_words {
        return Err(MetaError::DataCapacityExceeded {
            needed: live_words,
            capacity: data_word_capacity,
        });
    }

    let mut dest = MetadataBuffer::allocate(item_capacity, data_word_capacity)?;
    for index in 0..live_items {
        let entry = source.entry_at(index)?;
        let payload = match entry.payload {
            EntryPayload::Inline(bytes) => EntryPayload::Inline(bytes),
            EntryPayload::Offset(offset) => {
                // Raw byte copy: payloads are never decoded on this path.
                let bytes = source.read_payload(offset, entry.byte_size()).to_vec();
                EntryPayload::Offset(dest.append_payload(&bytes)?)
            }
        };
        dest.insert_entry(ItemEntry { payload, ..entry })?;
    }
    Ok(dest)
}
