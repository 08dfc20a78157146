//! Shared types, errors, and configuration for the devmeta buffer engine.
//!
//! This crate provides the definitions used by every devmeta component.

pub mod config;
pub mod error;
pub mod types;

pub use config::MetadataConfig;
pub use error::{MetaError, Result};
pub use types::{DataType, Rational, TagId, TagValues};
