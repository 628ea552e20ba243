//! Shared constants.

/// Shard layout used when no template is configured.
pub const DEFAULT_SHARD_TEMPLATE: &str = "{id02}/{id24}/{id}/{filename}";

/// URL prefix used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "/media/";

pub const ENV_STORAGE_BACKEND: &str = "FILER_STORAGE_BACKEND";
pub const ENV_ROOT: &str = "FILER_ROOT";
pub const ENV_BASE_URL: &str = "FILER_BASE_URL";
pub const ENV_SHARD_TEMPLATE: &str = "FILER_SHARD_TEMPLATE";
pub const ENV_ALLOW_OVERWRITE: &str = "FILER_ALLOW_OVERWRITE";
