//! Flat, relocatable device-metadata buffer engine.
//!
//! This crate provides:
//! - Buffer layout computation, allocation, and placement over external memory
//! - A sorted entry index with binary-search lookup
//! - An append-oriented data heap for payloads larger than four bytes
//! - Add/update/delete mutation under hard capacity limits
//! - Compaction into a freshly laid-out buffer
//! - Tag name resolution (static sections plus injected vendor tags)
//! - Diagnostic text dumps

mod buffer;
mod compact;
mod entry;
mod format;
mod layout;
mod registry;

pub use buffer::{EntryIter, ItemView, MetadataBuffer};
pub use compact::compact;
pub use entry::{EntryPayload, ItemEntry, INLINE_PAYLOAD_SIZE};
pub use format::{dump_buffer, dump_item};
pub use layout::{
    BufferLayout, MetadataHeader, DATA_ALIGNMENT, ITEM_ALIGNMENT, METADATA_VERSION, WORD_SIZE,
};
pub use registry::{Section, TagRegistry, VendorTag, VENDOR_SECTION_START};
