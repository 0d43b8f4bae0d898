//! Read-only store over a directory on disk.
//!
//! Lets the same policies run against a source tree that has not been
//! compiled in yet, which is what the `seedfs` binary does.

use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use seedfs_walk::{clean_start, DirEntry, EmbeddedFs, ROOT};
use tracing::debug;

/// A directory exposed through `EmbeddedFs`.
///
/// Store paths resolve under `root`. Symlinks and special files are not part
/// of the embedded model and are left out of listings.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a store path under the root.
    ///
    /// Rejects `..` so a store path can never leave the root.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let path = clean_start(path);
        let mut resolved = self.root.clone();
        if path == ROOT {
            return Ok(resolved);
        }
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("path escapes root: {path}"),
                    ));
                }
                name => resolved.push(name),
            }
        }
        Ok(resolved)
    }
}

impl EmbeddedFs for DirStore {
    type Entry = DirEntry;

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let full_path = self.resolve(path)?;
        let mut entries = Vec::new();

        for entry in fs::read_dir(&full_path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!(path = %entry.path().display(), "skipping non-UTF-8 name");
                continue;
            };

            if file_type.is_dir() {
                entries.push(DirEntry::directory(name));
            } else if file_type.is_file() {
                entries.push(DirEntry::file(name));
            } else {
                debug!(path = %entry.path().display(), "skipping symlink or special file");
            }
        }

        // Sort for consistent ordering
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)?;
        if meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", full_path.display()),
            ));
        }
        let file = fs::File::open(&full_path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfs_walk::EntryKind;
    use tempfile::TempDir;

    fn make_source() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("b/inner")).unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("z.txt"), b"z").unwrap();
        fs::write(temp.path().join("b/inner/deep.txt"), b"deep").unwrap();
        temp
    }

    #[test]
    fn test_list_sorted() {
        let temp = make_source();
        let store = DirStore::new(temp.path());
        let entries = store.read_dir(".").unwrap();
        let listed: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            listed,
            vec![
                ("a", EntryKind::Directory),
                ("b", EntryKind::Directory),
                ("z.txt", EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_open_nested() {
        let temp = make_source();
        let store = DirStore::new(temp.path());
        let mut buf = String::new();
        store
            .open("b/inner/deep.txt")
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "deep");
    }

    #[test]
    fn test_open_directory_fails() {
        let temp = make_source();
        let store = DirStore::new(temp.path());
        let kind = store.open("b").err().map(|e| e.kind());
        assert_eq!(kind, Some(io::ErrorKind::IsADirectory));
    }

    #[test]
    fn test_escape_rejected() {
        let temp = make_source();
        let store = DirStore::new(temp.path().join("b"));
        let err = store.read_dir("../").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_missing_dir() {
        let temp = make_source();
        let store = DirStore::new(temp.path());
        assert_eq!(store.read_dir("nope").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped() {
        let temp = make_source();
        std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("link")).unwrap();
        let store = DirStore::new(temp.path());
        let names: Vec<_> = store
            .read_dir(".")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "z.txt"]);
    }
}
