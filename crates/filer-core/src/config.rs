//! Configuration module
//!
//! Storage configuration is read once from the environment (optionally seeded
//! from a `.env` file) and is immutable afterwards. Every storage adapter is
//! constructed from a [`StorageConfig`].

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_SHARD_TEMPLATE, ENV_ALLOW_OVERWRITE, ENV_BASE_URL, ENV_ROOT,
    ENV_SHARD_TEMPLATE, ENV_STORAGE_BACKEND,
};
use crate::storage_types::StorageBackend;

/// Options recognised by the sharded storage adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Absolute directory under which every resolved path lives.
    pub root_directory: PathBuf,
    /// Prefix for generated public URLs.
    pub base_url: String,
    /// Shard template with `{id}`, `{id02}`, `{id24}` and `{filename}` placeholders.
    pub template: String,
    /// Whether saving to an already existing key replaces the file.
    pub allow_overwrite: bool,
}

impl StorageConfig {
    pub fn new(root_directory: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        StorageConfig {
            backend: StorageBackend::Sharded,
            root_directory: root_directory.into(),
            base_url: base_url.into(),
            template: DEFAULT_SHARD_TEMPLATE.to_string(),
            allow_overwrite: false,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_allow_overwrite(mut self, allow_overwrite: bool) -> Self {
        self.allow_overwrite = allow_overwrite;
        self
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `from_env` uses the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup(ENV_STORAGE_BACKEND) {
            Some(value) => value.parse()?,
            None => StorageBackend::Sharded,
        };

        let root_directory = lookup(ENV_ROOT)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("{} must be set", ENV_ROOT))?;

        let allow_overwrite = match lookup(ENV_ALLOW_OVERWRITE) {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                anyhow::anyhow!("{} must be a boolean, got {:?}", ENV_ALLOW_OVERWRITE, value)
            })?,
            None => false,
        };

        Ok(StorageConfig {
            backend,
            root_directory,
            base_url: lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            template: lookup(ENV_SHARD_TEMPLATE)
                .unwrap_or_else(|| DEFAULT_SHARD_TEMPLATE.to_string()),
            allow_overwrite,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.root_directory.is_absolute() {
            return Err(anyhow::anyhow!(
                "{} must be an absolute path, got {}",
                ENV_ROOT,
                self.root_directory.display()
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("{} must not be empty", ENV_BASE_URL));
        }

        // Full placeholder parsing happens in the storage crate.
        if !self.template.contains("{id") {
            return Err(anyhow::anyhow!(
                "{} must reference the file id ({{id}}, {{id02}} or {{id24}})",
                ENV_SHARD_TEMPLATE
            ));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    storage: StorageConfig,
    environment: String,
}

impl Config {
    pub fn new(storage: StorageConfig) -> Self {
        Config {
            storage,
            environment: "development".to_string(),
        }
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_current_env()
    }

    /// Read the process environment as it is, without loading `.env`.
    pub fn from_current_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = StorageConfig::from_lookup(&lookup)?;
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        Ok(Config {
            storage,
            environment,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.storage.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.backend
    }

    pub fn root_directory(&self) -> &std::path::Path {
        &self.storage.root_directory
    }

    pub fn base_url(&self) -> &str {
        &self.storage.base_url
    }

    pub fn shard_template(&self) -> &str {
        &self.storage.template
    }

    pub fn allow_overwrite(&self) -> bool {
        self.storage.allow_overwrite
    }
}
