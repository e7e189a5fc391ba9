//! Configuration module for archiving
//!
//! This module provides the `ArchiveConfig` struct, its type-safe builder and
//! loading from a TOML file.

// Sub-modules
pub mod builder;
pub mod file;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{ArchiveConfigBuilder, Complete, WithCookie};
pub use types::{ArchiveConfig, ConfigError};
