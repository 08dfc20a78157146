//! Allocation configuration for metadata buffers.

use serde::{Deserialize, Serialize};

/// Capacity pair for a freshly allocated metadata buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Maximum number of entries the buffer can hold.
    pub item_capacity: u32,
    /// Data heap capacity in 4-byte words.
    pub data_word_capacity: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            item_capacity: 64,
            data_word_capacity: 1024, // 4 KB data heap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MetadataConfig::default();
        assert_eq!(config.item_capacity, 64);
        assert_eq!(config.data_word_capacity, 1024);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = MetadataConfig {
            item_capacity: 8,
            data_word_capacity: 32,
        };
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: MetadataConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
