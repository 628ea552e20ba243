//! Recursive directory removal.

use crate::error::{StorageError, StorageResult};
use crate::fs::DirectoryOps;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

enum Visit {
    /// Delete the directory's files and schedule its subdirectories.
    Enter(PathBuf),
    /// Every child has been handled; remove the directory itself.
    Leave(PathBuf),
}

/// Remove `dir` and everything beneath it, bottom-up.
///
/// A missing `dir` is a no-op, so the call is idempotent under retry. The
/// traversal uses an explicit stack and handles any nesting depth.
///
/// On failure the traversal stops and the error names the failing path.
/// Entries removed before the failure stay removed, and every ancestor of
/// the failing entry is left in place. Nothing here locks: concurrent writers
/// or overlapping deletions race, and callers needing atomicity must
/// serialize deletions themselves. The future may be dropped (for example by
/// `tokio::time::timeout`), leaving the subtree partially deleted.
pub async fn delete_subtree(ops: &dyn DirectoryOps, dir: &Path) -> StorageResult<()> {
    let start = Instant::now();
    let mut files_removed = 0usize;
    let mut dirs_removed = 0usize;
    let mut stack = vec![Visit::Enter(dir.to_path_buf())];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(path) => {
                let children = match ops.list_children(&path).await {
                    Ok(children) => children,
                    // Already gone, either from an earlier attempt or a concurrent caller.
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(failed(path, e)),
                };

                stack.push(Visit::Leave(path));

                for child in children {
                    match ops.is_directory(&child).await {
                        Ok(true) => stack.push(Visit::Enter(child)),
                        Ok(false) => {
                            if let Err(e) = ops.delete_file(&child).await {
                                return Err(failed(child, e));
                            }
                            tracing::debug!(path = %child.display(), "Removed file");
                            files_removed += 1;
                        }
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(failed(child, e)),
                    }
                }
            }
            Visit::Leave(path) => {
                if let Err(e) = ops.delete_directory(&path).await {
                    return Err(failed(path, e));
                }
                tracing::debug!(path = %path.display(), "Removed directory");
                dirs_removed += 1;
            }
        }
    }

    tracing::info!(
        path = %dir.display(),
        files_removed,
        dirs_removed,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Subtree deleted"
    );

    Ok(())
}

fn failed(path: PathBuf, source: io::Error) -> StorageError {
    tracing::warn!(path = %path.display(), error = %source, "Subtree deletion failed");
    StorageError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{LocalFs, MemoryFs};
    use tempfile::tempdir;

    fn sample_tree() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.write_file("/store/root/a/x.txt", "x");
        fs.write_file("/store/root/a/b/y.txt", "y");
        fs.write_file("/store/root/c.txt", "c");
        fs.write_file("/store/keep.txt", "k");
        fs
    }

    #[tokio::test]
    async fn removes_whole_tree() {
        let fs = sample_tree();
        delete_subtree(&fs, Path::new("/store/root")).await.unwrap();

        for path in [
            "/store/root",
            "/store/root/a",
            "/store/root/a/x.txt",
            "/store/root/a/b",
            "/store/root/a/b/y.txt",
            "/store/root/c.txt",
        ] {
            assert!(!fs.exists(path), "{} should be gone", path);
        }
        assert!(fs.exists("/store/keep.txt"));
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let fs = sample_tree();
        delete_subtree(&fs, Path::new("/store/root")).await.unwrap();
        delete_subtree(&fs, Path::new("/store/root")).await.unwrap();
    }

    #[tokio::test]
    async fn missing_directory_is_a_no_op() {
        let fs = MemoryFs::new();
        delete_subtree(&fs, Path::new("/nothing/here")).await.unwrap();
    }

    #[tokio::test]
    async fn handles_deep_nesting() {
        let fs = MemoryFs::new();
        let mut deep = PathBuf::from("/deep");
        for i in 0..200 {
            deep.push(format!("level{}", i));
        }
        fs.write_file(deep.join("leaf.bin"), vec![0u8; 4]);

        delete_subtree(&fs, Path::new("/deep")).await.unwrap();
        assert!(fs.is_empty());
    }

    #[tokio::test]
    async fn failure_names_path_and_keeps_parents() {
        let fs = sample_tree();
        fs.fail_on("/store/root/a/b/y.txt");

        let err = delete_subtree(&fs, Path::new("/store/root"))
            .await
            .unwrap_err();
        match &err {
            StorageError::Io { path, source } => {
                assert_eq!(path, Path::new("/store/root/a/b/y.txt"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_retryable());

        assert!(fs.exists("/store/root/a/b/y.txt"));
        assert!(fs.exists("/store/root/a/b"));
        assert!(fs.exists("/store/root/a"));
        assert!(fs.exists("/store/root"));
        // Files directly under root were handled before descending.
        assert!(!fs.exists("/store/root/c.txt"));
    }

    #[tokio::test]
    async fn failing_directory_removal_propagates() {
        let fs = sample_tree();
        fs.fail_on("/store/root/a/b");

        let err = delete_subtree(&fs, Path::new("/store/root"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io { ref path, .. } if path == Path::new("/store/root/a/b")));
        assert!(!fs.exists("/store/root/a/b/y.txt"));
        assert!(fs.exists("/store/root/a"));
    }

    #[tokio::test]
    async fn removes_real_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/x.txt"), b"x").unwrap();
        std::fs::write(root.join("a/b/y.txt"), b"y").unwrap();
        std::fs::write(root.join("c.txt"), b"c").unwrap();

        delete_subtree(&LocalFs, &root).await.unwrap();
        assert!(!root.exists());
        assert!(dir.path().exists());

        delete_subtree(&LocalFs, &root).await.unwrap();
    }
}
