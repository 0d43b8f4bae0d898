//! In-memory host filesystem.
//!
//! Used for tests and dry runs. All data is ephemeral.

use super::{HostFs, Metadata, DIR_MODE};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8> },
    Directory { mode: u32 },
}

type Entries = BTreeMap<PathBuf, Entry>;

/// In-memory filesystem.
///
/// Cloning shares the underlying tree. All data is lost when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    entries: Arc<Mutex<Entries>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        // Root directory always exists
        entries.insert(PathBuf::new(), Entry::Directory { mode: DIR_MODE });
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
            }
        }
        result
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory filesystem lock poisoned"))
    }

    /// Create `path` and all missing ancestors as directories.
    fn make_dirs(entries: &mut Entries, path: &Path, mode: u32) -> io::Result<()> {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            match entries.get(&current) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("file exists: {}", current.display()),
                    ));
                }
                None => {
                    entries.insert(current.clone(), Entry::Directory { mode });
                }
            }
        }
        Ok(())
    }

    /// Write a file directly, creating parent directories as needed.
    ///
    /// Meant for setting up a destination before running a policy.
    pub fn insert_file(&self, path: impl AsRef<Path>, data: &[u8]) -> io::Result<()> {
        let normalized = Self::normalize(path.as_ref());
        let mut entries = self.lock()?;
        if let Some(parent) = normalized.parent() {
            Self::make_dirs(&mut entries, parent, DIR_MODE)?;
        }
        if let Some(Entry::Directory { .. }) = entries.get(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", normalized.display()),
            ));
        }
        entries.insert(
            normalized,
            Entry::File {
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    /// Read the entire contents of a file.
    pub fn read(&self, path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        let path = path.as_ref();
        let entries = self.lock()?;
        match entries.get(&Self::normalize(path)) {
            Some(Entry::File { data }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {}", path.display()),
            )),
        }
    }

    /// Every path in the tree except the root, in sorted order.
    ///
    /// Directories carry a trailing `/`.
    pub fn paths(&self) -> io::Result<Vec<String>> {
        self.paths_under("")
    }

    /// Every path strictly below `root`, relative to it, in sorted order.
    ///
    /// Directories carry a trailing `/`. Ancestors of `root` are left out.
    pub fn paths_under(&self, root: impl AsRef<Path>) -> io::Result<Vec<String>> {
        let root = Self::normalize(root.as_ref());
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter_map(|(path, entry)| {
                let rel = path.strip_prefix(&root).ok()?;
                if rel.as_os_str().is_empty() {
                    return None;
                }
                let mut s = rel.to_string_lossy().replace('\\', "/");
                if matches!(entry, Entry::Directory { .. }) {
                    s.push('/');
                }
                Some(s)
            })
            .collect())
    }
}

impl HostFs for MemoryFs {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.lock()?;
        Self::make_dirs(&mut entries, &normalized, mode)
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let normalized = Self::normalize(path);
        let mut entries = self.lock()?;

        let parent = normalized.parent().map(Path::to_path_buf).unwrap_or_default();
        match entries.get(&parent) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", parent.display()),
                ));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("not found: {}", parent.display()),
                ));
            }
        }

        if let Some(Entry::Directory { .. }) = entries.get(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            ));
        }

        entries.insert(normalized.clone(), Entry::File { data: Vec::new() });
        Ok(Box::new(MemoryFile {
            fs: self,
            path: normalized,
        }))
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let entries = self.lock()?;
        match entries.get(&Self::normalize(path)) {
            Some(Entry::File { data }) => Ok(Metadata {
                is_dir: false,
                is_file: true,
                size: data.len() as u64,
                permissions: None,
            }),
            Some(Entry::Directory { mode }) => Ok(Metadata {
                is_dir: true,
                is_file: false,
                size: 0,
                permissions: Some(*mode),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {}", path.display()),
            )),
        }
    }
}

/// Write handle returned by `MemoryFs::create_file`.
struct MemoryFile<'a> {
    fs: &'a MemoryFs,
    path: PathBuf,
}

impl Write for MemoryFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut entries = self.fs.lock()?;
        match entries.get_mut(&self.path) {
            Some(Entry::File { data }) => {
                data.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file vanished: {}", self.path.display()),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFs::new();
        let mut sink = fs.create_file(Path::new("test.txt")).unwrap();
        sink.write_all(b"hello ").unwrap();
        sink.write_all(b"world").unwrap();
        drop(sink);
        assert_eq!(fs.read("test.txt").unwrap(), b"hello world");
    }

    #[test]
    fn test_create_file_truncates() {
        let fs = MemoryFs::new();
        fs.insert_file("file.txt", b"first").unwrap();
        drop(fs.create_file(Path::new("file.txt")).unwrap());
        assert_eq!(fs.read("file.txt").unwrap(), b"");
    }

    #[test]
    fn test_create_file_needs_parent() {
        let fs = MemoryFs::new();
        let result = fs.create_file(Path::new("a/b.txt"));
        assert_eq!(result.err().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn test_create_file_over_directory() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("dir"), DIR_MODE).unwrap();
        let result = fs.create_file(Path::new("dir"));
        assert_eq!(result.err().map(|e| e.kind()), Some(io::ErrorKind::IsADirectory));
    }

    #[test]
    fn test_nested_directories() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/out/a/b/c"), 0o700).unwrap();

        for dir in ["out", "out/a", "out/a/b", "out/a/b/c"] {
            let meta = fs.stat(Path::new(dir)).unwrap();
            assert!(meta.is_dir, "{dir} should be a directory");
            assert_eq!(meta.permissions, Some(0o700));
        }
    }

    #[test]
    fn test_create_dir_through_file_fails() {
        let fs = MemoryFs::new();
        fs.insert_file("a", b"file").unwrap();
        let err = fs.create_dir_all(Path::new("a/b"), DIR_MODE).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_stat_not_found() {
        let fs = MemoryFs::new();
        let err = fs.stat(Path::new("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.stat(Path::new("/")).unwrap().is_dir);
    }

    #[test]
    fn test_path_normalization() {
        let fs = MemoryFs::new();
        fs.insert_file("/a/b/c.txt", b"data").unwrap();

        let data1 = fs.read("a/b/c.txt").unwrap();
        let data2 = fs.read("/a/b/c.txt").unwrap();
        let data3 = fs.read("a/./b/c.txt").unwrap();
        let data4 = fs.read("a/b/../b/c.txt").unwrap();

        assert_eq!(data1, data2);
        assert_eq!(data2, data3);
        assert_eq!(data3, data4);
    }

    #[test]
    fn test_paths_listing() {
        let fs = MemoryFs::new();
        fs.insert_file("a/one.txt", b"1").unwrap();
        fs.create_dir_all(Path::new("b"), DIR_MODE).unwrap();
        assert_eq!(fs.paths().unwrap(), vec!["a/", "a/one.txt", "b/"]);
    }

    #[test]
    fn test_paths_under_root() {
        let fs = MemoryFs::new();
        fs.insert_file("/tmp/site/conf/app.toml", b"1").unwrap();
        fs.insert_file("/tmp/sitemap.txt", b"2").unwrap();
        assert_eq!(
            fs.paths_under("/tmp/site").unwrap(),
            vec!["conf/", "conf/app.toml"]
        );
        assert!(fs.paths_under("/nowhere").unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_tree() {
        let fs = MemoryFs::new();
        let other = fs.clone();
        other.insert_file("shared.txt", b"x").unwrap();
        assert_eq!(fs.read("shared.txt").unwrap(), b"x");
    }
}
