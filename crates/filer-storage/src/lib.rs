//! Filer Storage Library
//!
//! Sharded filesystem storage: an opaque file key `<id>/<filename>` is mapped
//! onto a nested directory layout derived from the leading characters of the
//! id, so no single directory accumulates an unbounded number of entries.
//!
//! # Layout
//!
//! With the default template `{id02}/{id24}/{id}/{filename}` the key
//! `abcd1234/photo.jpg` lives at `<root>/ab/cd/abcd1234/photo.jpg` and is
//! served from `<base_url>/ab/cd/abcd1234/photo.jpg`. Paths and URLs are
//! rendered from the same template so they always agree.
//!
//! Resolution is pure and may be called concurrently. Directory cleanup
//! ([`delete_subtree`]) mutates the filesystem without any locking; callers
//! that need atomicity must serialize deletions themselves.

pub mod cleanup;
pub mod error;
pub mod factory;
pub mod fs;
pub mod key;
pub mod local;
pub mod resolver;
pub mod template;
pub mod traits;

// Re-export commonly used types
pub use cleanup::delete_subtree;
pub use error::{StorageError, StorageResult};
pub use factory::create_storage;
pub use filer_core::StorageBackend;
pub use fs::{DirectoryOps, LocalFs, MemoryFs};
pub use key::FileKey;
pub use local::ShardedStorage;
pub use resolver::{PathResolver, ShardedPathResolver};
pub use template::ShardTemplate;
pub use traits::{ByteStream, DirectoryListing, Storage};
