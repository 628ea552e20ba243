use super::{ignore_not_found, DirectoryOps};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// [`DirectoryOps`] over the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl DirectoryOps for LocalFs {
    async fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            children.push(entry.path());
        }
        Ok(children)
    }

    async fn is_directory(&self, path: &Path) -> io::Result<bool> {
        let meta = fs::symlink_metadata(path).await?;
        Ok(meta.file_type().is_dir())
    }

    async fn delete_file(&self, path: &Path) -> io::Result<()> {
        ignore_not_found(fs::remove_file(path).await)
    }

    async fn delete_directory(&self, path: &Path) -> io::Result<()> {
        ignore_not_found(fs::remove_dir(path).await)
    }
}
