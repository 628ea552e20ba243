//! Key-to-location resolution.

use crate::error::{StorageError, StorageResult};
use crate::key::FileKey;
use crate::template::ShardTemplate;
use std::path::{Component, Path, PathBuf};

/// Maps file keys to filesystem paths and public URLs.
///
/// Implementations must be pure: the same key always resolves to the same
/// location, and `resolve_path` and `resolve_url` share one relative suffix.
pub trait PathResolver: Send + Sync {
    /// Location of `key` relative to both the storage root and the base URL.
    fn relative_path(&self, key: &str) -> StorageResult<String>;

    fn resolve_path(&self, key: &str) -> StorageResult<PathBuf>;

    fn resolve_url(&self, key: &str) -> StorageResult<String>;
}

/// Resolver that shards keys by the leading characters of their id.
#[derive(Debug, Clone)]
pub struct ShardedPathResolver {
    root: PathBuf,
    base_url: String,
    template: ShardTemplate,
}

impl ShardedPathResolver {
    /// # Arguments
    /// * `root` - Storage root directory (e.g., "/var/lib/filer")
    /// * `base_url` - Prefix for public URLs (e.g., "https://cdn.example.com/media")
    /// * `template` - Shard template shared by paths and URLs
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        template: ShardTemplate,
    ) -> Self {
        ShardedPathResolver {
            root: root.into(),
            base_url: base_url.into(),
            template,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn template(&self) -> &ShardTemplate {
        &self.template
    }
}

impl PathResolver for ShardedPathResolver {
    fn relative_path(&self, key: &str) -> StorageResult<String> {
        let parsed = FileKey::parse(key)?;
        let relative = self.template.render(&parsed);
        ensure_contained(Path::new(&relative)).map_err(|reason| {
            StorageError::InvalidKey(format!("key {:?} {}", key, reason))
        })?;
        Ok(relative)
    }

    fn resolve_path(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join(self.relative_path(key)?))
    }

    fn resolve_url(&self, key: &str) -> StorageResult<String> {
        let relative = self.relative_path(key)?;
        let encoded: Vec<String> = relative
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encoded.join("/")
        ))
    }
}

/// Reject relative paths that could escape the directory they are joined to.
pub(crate) fn ensure_contained(relative: &Path) -> Result<(), &'static str> {
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("contains a parent directory reference"),
            Component::RootDir | Component::Prefix(_) => return Err("resolves to an absolute path"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ShardedPathResolver {
        ShardedPathResolver::new(
            "/srv/filer",
            "https://cdn.example.com/media/",
            ShardTemplate::default(),
        )
    }

    #[test]
    fn shards_by_id_prefix() {
        let path = resolver().resolve_path("abcd1234/photo.jpg").unwrap();
        assert!(path.ends_with("ab/cd/abcd1234/photo.jpg"));
        assert_eq!(path, PathBuf::from("/srv/filer/ab/cd/abcd1234/photo.jpg"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let r = resolver();
        for key in ["abcd1234/photo.jpg", "a/photo.jpg", "onlyid", "ffee/a b.txt"] {
            assert_eq!(r.resolve_path(key).unwrap(), r.resolve_path(key).unwrap());
            assert_eq!(r.resolve_url(key).unwrap(), r.resolve_url(key).unwrap());
        }
    }

    #[test]
    fn url_and_path_share_the_suffix() {
        let r = resolver();
        for key in ["abcd1234/photo.jpg", "9f86d081/report-2024.pdf", "c0ffee42/a.txt"] {
            let path = r.resolve_path(key).unwrap();
            let url = r.resolve_url(key).unwrap();
            let path_suffix = path.strip_prefix("/srv/filer").unwrap().to_str().unwrap();
            let url_suffix = url.strip_prefix("https://cdn.example.com/media/").unwrap();
            assert_eq!(path_suffix, r.relative_path(key).unwrap());
            assert_eq!(url_suffix, r.relative_path(key).unwrap());
        }
    }

    #[test]
    fn url_segments_are_percent_encoded() {
        let url = resolver().resolve_url("abcd1234/my photo.jpg").unwrap();
        assert_eq!(url, "https://cdn.example.com/media/ab/cd/abcd1234/my%20photo.jpg");
    }

    #[test]
    fn short_id_is_well_formed() {
        let r = resolver();
        let relative = r.relative_path("a/photo.jpg").unwrap();
        assert_eq!(relative, "a//a/photo.jpg");
        assert!(r.resolve_path("a/photo.jpg").unwrap().ends_with("a/a/photo.jpg"));
    }

    #[test]
    fn key_without_delimiter_resolves() {
        let relative = resolver().relative_path("onlyid").unwrap();
        assert_eq!(relative, "on/ly/onlyid/");
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            resolver().resolve_path(""),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            resolver().resolve_url(""),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn traversal_is_rejected() {
        let r = ShardedPathResolver::new(
            "/srv/filer",
            "/media",
            ShardTemplate::parse("{id}/{filename}").unwrap(),
        );
        assert!(matches!(
            r.resolve_path("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            r.resolve_path("abcd/../../x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
