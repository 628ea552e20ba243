//! Minimal filesystem capability used for directory cleanup and listing.
//!
//! Cleanup only needs to list, classify and remove entries, so it is written
//! against [`DirectoryOps`] rather than `tokio::fs` directly. [`LocalFs`] is the
//! real implementation; [`MemoryFs`] is an in-memory tree for tests.

mod local;
mod memory;

pub use local::LocalFs;
pub use memory::MemoryFs;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait DirectoryOps: Send + Sync {
    /// Full paths of the immediate children of `dir`.
    ///
    /// Fails with `NotFound` when `dir` does not exist.
    async fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is a directory. Symbolic links are never followed.
    async fn is_directory(&self, path: &Path) -> io::Result<bool>;

    /// Remove a file. Removing a missing file succeeds.
    async fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory. Removing a missing directory succeeds.
    async fn delete_directory(&self, path: &Path) -> io::Result<()>;
}

pub(crate) fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
