//! Filer Core Library
//!
//! This crate provides the configuration and shared constants used by the
//! filer storage crates and the `filer` command-line tool.

pub mod config;
pub mod constants;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, StorageConfig};
pub use storage_types::StorageBackend;
