//! File key parsing.
//!
//! A key has the shape `<id>/<filename>`. Only the first `/` separates the two
//! parts, so filenames may themselves contain slashes.

use crate::error::{StorageError, StorageResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    id: String,
    filename: String,
}

impl FileKey {
    /// Split `key` on its first `/`.
    ///
    /// A key without `/` has an empty filename. An empty key, or one whose id
    /// segment is empty (`"/photo.jpg"`), is rejected.
    pub fn parse(key: &str) -> StorageResult<Self> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".to_string()));
        }

        let (id, filename) = key.split_once('/').unwrap_or((key, ""));

        if id.is_empty() {
            return Err(StorageError::InvalidKey(format!(
                "key {:?} has no id segment",
                key
            )));
        }

        Ok(FileKey {
            id: id.to_string(),
            filename: filename.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// First two characters of the id; shorter ids yield what is there.
    pub fn id02(&self) -> &str {
        char_slice(&self.id, 0, 2)
    }

    /// Third and fourth characters of the id; empty for ids shorter than three.
    pub fn id24(&self) -> &str {
        char_slice(&self.id, 2, 4)
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.filename)
    }
}

/// Slice by character positions, clamped to the string length.
fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let offset = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    &s[offset(start)..offset(end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_slash() {
        let key = FileKey::parse("abcd1234/photo.jpg").unwrap();
        assert_eq!(key.id(), "abcd1234");
        assert_eq!(key.filename(), "photo.jpg");
        assert_eq!(key.id02(), "ab");
        assert_eq!(key.id24(), "cd");
    }

    #[test]
    fn filename_keeps_further_slashes() {
        let key = FileKey::parse("abcd/sub/dir/file.txt").unwrap();
        assert_eq!(key.id(), "abcd");
        assert_eq!(key.filename(), "sub/dir/file.txt");
    }

    #[test]
    fn key_without_slash_has_empty_filename() {
        let key = FileKey::parse("onlyid").unwrap();
        assert_eq!(key.id(), "onlyid");
        assert_eq!(key.filename(), "");
    }

    #[test]
    fn short_ids_degrade_to_short_shards() {
        let key = FileKey::parse("a/photo.jpg").unwrap();
        assert_eq!(key.id02(), "a");
        assert_eq!(key.id24(), "");

        let key = FileKey::parse("abc/photo.jpg").unwrap();
        assert_eq!(key.id02(), "ab");
        assert_eq!(key.id24(), "c");
    }

    #[test]
    fn multibyte_ids_do_not_panic() {
        let key = FileKey::parse("ééçà9/x").unwrap();
        assert_eq!(key.id02(), "éé");
        assert_eq!(key.id24(), "çà");
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(matches!(FileKey::parse(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn empty_id_is_invalid() {
        assert!(matches!(
            FileKey::parse("/photo.jpg"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
