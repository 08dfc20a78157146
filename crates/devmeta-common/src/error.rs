//! Error types for the devmeta buffer engine.

use crate::types::{DataType, TagId};
use thiserror::Error;

/// Result type alias using MetaError.
pub type Result<T> = std::result::Result<T, MetaError>;

/// Errors that can occur in metadata buffer operations.
#[derive(Debug, Error)]
pub enum MetaError {
    // Parameter errors
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Type mismatch for item {item}: expected {expected}, got {actual}")]
    TypeMismatch {
        item: TagId,
        expected: DataType,
        actual: DataType,
    },

    #[error("Item already present: {0}")]
    DuplicateItem(TagId),

    // Not-found errors
    #[error("Item not found: {0}")]
    ItemNotFound(TagId),

    #[error("Entry index out of range: {index} (entry count {count})")]
    IndexOutOfRange { index: u32, count: u32 },

    // Capacity errors
    #[error("Item capacity exceeded: buffer holds at most {capacity} entries")]
    ItemCapacityExceeded { capacity: u32 },

    #[error("Data capacity exceeded: {needed} more words needed, capacity is {capacity}")]
    DataCapacityExceeded { needed: u32, capacity: u32 },

    // Layout/allocation errors
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Buffer layout size computation overflowed")]
    LayoutOverflow,

    #[error("Corrupt buffer: {0}")]
    CorruptBuffer(String),
}
