//! Storage abstraction trait
//!
//! This module defines the Storage trait that storage backends implement.

use crate::error::{StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Stream of file content chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Immediate entries of a storage directory, by name, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// Storage abstraction trait
///
/// Content is addressed by file keys (`<id>/<filename>`). Where a key lives
/// is decided by the backend's resolver; callers never build paths themselves.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    ///
    /// Fails with `AlreadyExists` when the key is taken and the backend does
    /// not allow overwriting.
    async fn save(&self, key: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Store the content of a reader under `key` (for large files).
    ///
    /// The reader is consumed until EOF. Returns the public URL.
    async fn save_stream(
        &self,
        key: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String>;

    /// Read the whole file stored under `key`.
    async fn open(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Read the file stored under `key` as a stream of chunks.
    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete the file stored under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of the file stored under `key`.
    async fn size(&self, key: &str) -> StorageResult<u64>;

    /// Filesystem location of `key`. Performs no I/O.
    fn path(&self, key: &str) -> StorageResult<PathBuf>;

    /// Public URL of `key`. Performs no I/O.
    fn url(&self, key: &str) -> StorageResult<String>;

    /// List a directory given relative to the storage root.
    async fn listdir(&self, dir: &str) -> StorageResult<DirectoryListing>;

    /// Recursively delete a directory given relative to the storage root.
    async fn delete_directory(&self, dir: &str) -> StorageResult<()>;

    fn backend_type(&self) -> StorageBackend;
}
