use crate::{ShardedStorage, Storage, StorageBackend, StorageError, StorageResult};
use filer_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    config
        .validate()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    match config.storage_backend() {
        StorageBackend::Sharded => {
            let storage = ShardedStorage::new(config.storage()).await?;
            tracing::info!(
                root = %config.root_directory().display(),
                base_url = %config.base_url(),
                template = %config.shard_template(),
                allow_overwrite = config.allow_overwrite(),
                "Sharded storage initialized"
            );
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filer_core::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_sharded_storage() {
        let dir = tempdir().unwrap();
        let config = Config::new(StorageConfig::new(dir.path(), "/media/"));

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Sharded);
        assert_eq!(
            storage.url("abcd1234/x.png").unwrap(),
            "/media/ab/cd/abcd1234/x.png"
        );
    }

    #[tokio::test]
    async fn rejects_invalid_template() {
        let dir = tempdir().unwrap();
        let config = Config::new(
            StorageConfig::new(dir.path(), "/media/").with_template("{id}/{unknown}"),
        );

        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::InvalidTemplate(_))
        ));
    }

    #[tokio::test]
    async fn rejects_relative_root() {
        let config = Config::new(StorageConfig::new("relative/root", "/media/"));
        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
