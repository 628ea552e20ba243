use super::DirectoryOps;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<PathBuf, Node>,
    failing: HashSet<PathBuf>,
}

/// In-memory [`DirectoryOps`] implementation.
///
/// Paths registered with [`MemoryFs::fail_on`] refuse deletion with
/// `PermissionDenied`, which lets tests exercise partial cleanup.
#[derive(Debug, Default)]
pub struct MemoryFs {
    inner: Mutex<Inner>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create `path` and any missing ancestors as directories.
    ///
    /// The filesystem root itself is implicit and never stored.
    pub fn create_dir_all(&self, path: impl AsRef<Path>) {
        let mut inner = self.lock();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.parent().is_none() {
                continue;
            }
            inner
                .nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    /// Write a file, creating its parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent);
        }
        self.lock()
            .nodes
            .insert(path.to_path_buf(), Node::File(contents.into()));
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.lock().nodes.contains_key(path.as_ref())
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Make every later deletion of `path` fail.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.lock().failing.insert(path.as_ref().to_path_buf());
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("deletion of {} refused", path.display()),
    )
}

#[async_trait]
impl DirectoryOps for MemoryFs {
    async fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let inner = self.lock();
        match inner.nodes.get(dir) {
            Some(Node::Dir) => Ok(inner
                .nodes
                .keys()
                .filter(|p| p.parent() == Some(dir))
                .cloned()
                .collect()),
            Some(Node::File(_)) => Err(io::Error::other(format!(
                "{} is not a directory",
                dir.display()
            ))),
            None => Err(not_found(dir)),
        }
    }

    async fn is_directory(&self, path: &Path) -> io::Result<bool> {
        match self.lock().nodes.get(path) {
            Some(node) => Ok(*node == Node::Dir),
            None => Err(not_found(path)),
        }
    }

    async fn delete_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.failing.contains(path) {
            return Err(denied(path));
        }
        match inner.nodes.get(path) {
            Some(Node::File(_)) => {
                inner.nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Ok(()),
        }
    }

    async fn delete_directory(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.failing.contains(path) {
            return Err(denied(path));
        }
        match inner.nodes.get(path) {
            Some(Node::Dir) => {
                if inner.nodes.keys().any(|p| p.parent() == Some(path)) {
                    return Err(io::Error::other(format!(
                        "{} is not empty",
                        path.display()
                    )));
                }
                inner.nodes.remove(path);
                Ok(())
            }
            Some(Node::File(_)) => Err(io::Error::other(format!(
                "{} is not a directory",
                path.display()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_file_creates_parents() {
        let fs = MemoryFs::new();
        fs.write_file("/root/a/b.txt", "hi");

        assert!(fs.is_directory(Path::new("/root/a")).await.unwrap());
        assert!(!fs.is_directory(Path::new("/root/a/b.txt")).await.unwrap());
        assert_eq!(fs.read_file("/root/a/b.txt").unwrap(), b"hi");
        assert_eq!(
            fs.list_children(Path::new("/root")).await.unwrap(),
            vec![PathBuf::from("/root/a")]
        );
    }

    #[tokio::test]
    async fn refuses_to_remove_non_empty_directory() {
        let fs = MemoryFs::new();
        fs.write_file("/d/f", "x");
        assert!(fs.delete_directory(Path::new("/d")).await.is_err());
        fs.delete_file(Path::new("/d/f")).await.unwrap();
        fs.delete_directory(Path::new("/d")).await.unwrap();
        assert!(!fs.exists("/d"));
    }

    #[tokio::test]
    async fn injected_failures() {
        let fs = MemoryFs::new();
        fs.write_file("/d/f", "x");
        fs.fail_on("/d/f");
        let err = fs.delete_file(Path::new("/d/f")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
