use crate::cleanup::delete_subtree;
use crate::error::{StorageError, StorageResult};
use crate::fs::{DirectoryOps, LocalFs};
use crate::resolver::{ensure_contained, PathResolver, ShardedPathResolver};
use crate::template::ShardTemplate;
use crate::traits::{ByteStream, DirectoryListing, Storage};
use crate::StorageBackend;
use async_trait::async_trait;
use filer_core::StorageConfig;
use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Local filesystem storage with a sharded directory layout
#[derive(Debug, Clone)]
pub struct ShardedStorage {
    resolver: ShardedPathResolver,
    allow_overwrite: bool,
    fs: LocalFs,
}

impl ShardedStorage {
    /// Create a new ShardedStorage instance, creating the root directory if needed.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let template = ShardTemplate::parse(&config.template)?;
        let resolver = ShardedPathResolver::new(
            config.root_directory.clone(),
            config.base_url.clone(),
            template,
        );
        Self::with_resolver(resolver, config.allow_overwrite).await
    }

    pub async fn with_resolver(
        resolver: ShardedPathResolver,
        allow_overwrite: bool,
    ) -> StorageResult<Self> {
        fs::create_dir_all(resolver.root()).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                resolver.root().display(),
                e
            ))
        })?;

        Ok(ShardedStorage {
            resolver,
            allow_overwrite,
            fs: LocalFs,
        })
    }

    pub fn resolver(&self) -> &ShardedPathResolver {
        &self.resolver
    }

    pub fn allow_overwrite(&self) -> bool {
        self.allow_overwrite
    }

    /// Resolve a root-relative directory, refusing anything outside the root.
    fn dir_to_path(&self, dir: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(dir.trim_start_matches('/'));
        ensure_contained(relative).map_err(|reason| {
            StorageError::InvalidKey(format!("directory {:?} {}", dir, reason))
        })?;
        Ok(self.resolver.root().join(relative))
    }

    /// Create a hidden staging file next to `path`.
    ///
    /// A concurrent `delete` may prune the freshly created shard directory
    /// before the file is opened, so creation is retried once on `NotFound`.
    async fn create_staging(&self, path: &Path) -> StorageResult<(PathBuf, fs::File)> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(format!("{} has no parent", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = parent.join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

        let mut attempt = 0;
        loop {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staging)
                .await
            {
                Ok(file) => return Ok((staging, file)),
                Err(e) if e.kind() == io::ErrorKind::NotFound && attempt == 0 => attempt += 1,
                Err(e) => {
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to create file {}: {}",
                        staging.display(),
                        e
                    )))
                }
            }
        }
    }

    /// Move a fully written staging file to its final location.
    ///
    /// Overwriting renames over the target. Otherwise the staging file is
    /// hard-linked to the target, which fails if the key is already taken.
    async fn commit_staging(&self, key: &str, staging: &Path, path: &Path) -> StorageResult<()> {
        let result = if self.allow_overwrite {
            fs::rename(staging, path).await
        } else {
            fs::hard_link(staging, path).await
        };

        if !self.allow_overwrite || result.is_err() {
            let _ = fs::remove_file(staging).await;
        }

        result.map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(key.to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to move {} into place: {}",
                    path.display(),
                    e
                ))
            }
        })
    }

    /// Write `reader` to the location of `key`.
    ///
    /// Content is staged and synced before it becomes visible under the key,
    /// so a failed write never leaves a truncated file or clobbers the
    /// previous content.
    async fn write_staged<R>(&self, key: &str, path: &Path, reader: &mut R) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        if !self.allow_overwrite && fs::try_exists(path).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }

        let (staging, mut file) = self.create_staging(path).await?;

        let written = async {
            let bytes = tokio::io::copy(reader, &mut file).await?;
            file.sync_all().await?;
            Ok::<u64, io::Error>(bytes)
        }
        .await;
        drop(file);

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                tracing::warn!(path = %path.display(), key = %key, error = %e, "Save failed");
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        self.commit_staging(key, &staging, path).await?;
        Ok(bytes)
    }

    /// Remove directories left empty by a deletion, stopping at the root.
    async fn prune_empty_parents(&self, path: &Path) {
        let root = self.resolver.root();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == root || !dir.starts_with(root) {
                break;
            }
            // Fails on the first non-empty directory, which ends the walk.
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            tracing::debug!(path = %dir.display(), "Pruned empty shard directory");
            current = dir.parent();
        }
    }
}

fn not_found_or(key: &str, path: &Path, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
    }
}

#[async_trait]
impl Storage for ShardedStorage {
    async fn save(&self, key: &str, data: Vec<u8>) -> StorageResult<String> {
        let path = self.resolver.resolve_path(key)?;
        let start = std::time::Instant::now();

        let mut reader = std::io::Cursor::new(data);
        let size = self.write_staged(key, &path, &mut reader).await?;

        let url = self.resolver.resolve_url(key)?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sharded storage save successful"
        );

        Ok(url)
    }

    async fn save_stream(
        &self,
        key: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        let path = self.resolver.resolve_path(key)?;
        let start = std::time::Instant::now();

        let bytes_copied = self.write_staged(key, &path, &mut reader).await?;

        let url = self.resolver.resolve_url(key)?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sharded storage stream save successful"
        );

        Ok(url)
    }

    async fn open(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolver.resolve_path(key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path)
            .await
            .map_err(|e| not_found_or(key, &path, e))?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sharded storage open successful"
        );

        Ok(data)
    }

    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let path = self.resolver.resolve_path(key)?;

        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or(key, &path, e))?;

        let key = key.to_string();
        let path_display = path.display().to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    error = %e,
                    "Sharded storage stream read error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolver.resolve_path(key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::io(path, e)),
        }

        self.prune_empty_parents(&path).await;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sharded storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.resolver.resolve_path(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn size(&self, key: &str) -> StorageResult<u64> {
        let path = self.resolver.resolve_path(key)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| not_found_or(key, &path, e))?;
        Ok(meta.len())
    }

    fn path(&self, key: &str) -> StorageResult<PathBuf> {
        self.resolver.resolve_path(key)
    }

    fn url(&self, key: &str) -> StorageResult<String> {
        self.resolver.resolve_url(key)
    }

    async fn listdir(&self, dir: &str) -> StorageResult<DirectoryListing> {
        let path = self.dir_to_path(dir)?;

        let children = self.fs.list_children(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(dir.to_string())
            } else {
                StorageError::io(&path, e)
            }
        })?;

        let mut listing = DirectoryListing::default();
        for child in children {
            let Some(name) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match self.fs.is_directory(&child).await {
                Ok(true) => listing.directories.push(name),
                Ok(false) => listing.files.push(name),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(child, e)),
            }
        }
        listing.directories.sort();
        listing.files.sort();

        Ok(listing)
    }

    async fn delete_directory(&self, dir: &str) -> StorageResult<()> {
        let path = self.dir_to_path(dir)?;
        if path.components().eq(self.resolver.root().components()) {
            return Err(StorageError::InvalidKey(format!(
                "directory {:?} is the storage root",
                dir
            )));
        }
        delete_subtree(&self.fs, &path).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Sharded
    }
}
