//! Compiled-in store built from static byte tables.

use std::collections::BTreeMap;
use std::io::{self, Read};

use seedfs_walk::{clean_start, join_virtual, sanitize, DirEntry, EmbeddedFs, EntryKind, ROOT};

/// Read-only tree over `&'static` data, usually `include_bytes!` output.
///
/// Paths are forward-slash relative paths. A path ending in `/` declares a
/// directory (its bytes are ignored), which is the only way to ship an
/// empty directory. Every other directory is implied by the files below it.
///
/// ```
/// use seedfs_kernel::{EmbeddedFs, StaticStore};
///
/// let store = StaticStore::new(&[
///     ("templates/index.html", b"<html></html>"),
///     ("cache/", b""),
/// ])?;
/// let root = store.read_dir(".")?;
/// assert_eq!(root.len(), 2);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct StaticStore {
    /// Directory path -> child name -> kind. The root is `"."`.
    dirs: BTreeMap<String, BTreeMap<String, EntryKind>>,
    files: BTreeMap<String, &'static [u8]>,
}

impl StaticStore {
    /// Build a store from `(path, bytes)` pairs.
    ///
    /// Fails with `InvalidInput` when a path is used as both a file and a
    /// directory, or contains `.`/`..`/empty components.
    pub fn new(entries: &[(&'static str, &'static [u8])]) -> io::Result<Self> {
        let mut store = Self {
            dirs: BTreeMap::new(),
            files: BTreeMap::new(),
        };
        store.dirs.insert(ROOT.to_string(), BTreeMap::new());

        for (raw, data) in entries {
            let is_dir = sanitize(raw).ends_with('/');
            let path = clean_start(raw.trim_start_matches(['/', '\\']));
            if path == ROOT {
                continue;
            }
            let components: Vec<&str> = path.split('/').collect();
            if components.iter().any(|c| c.is_empty() || *c == "." || *c == "..") {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid embedded path: {raw:?}"),
                ));
            }

            let mut parent = ROOT.to_string();
            for (i, name) in components.iter().enumerate() {
                let last = i + 1 == components.len();
                let kind = if last && !is_dir {
                    EntryKind::File
                } else {
                    EntryKind::Directory
                };
                let full = join_virtual(&parent, name);
                store.link(&parent, name, kind, raw)?;
                match kind {
                    EntryKind::Directory => {
                        store.dirs.entry(full.clone()).or_default();
                    }
                    EntryKind::File => {
                        store.files.insert(full.clone(), *data);
                    }
                }
                parent = full;
            }
        }
        Ok(store)
    }

    fn link(&mut self, parent: &str, name: &str, kind: EntryKind, raw: &str) -> io::Result<()> {
        let children = self.dirs.entry(parent.to_string()).or_default();
        match children.get(name) {
            Some(existing) if *existing != kind => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("embedded path {raw:?} is both a file and a directory"),
            )),
            _ => {
                children.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }
}

impl EmbeddedFs for StaticStore {
    type Entry = DirEntry;

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let key = clean_start(path);
        match self.dirs.get(&key) {
            Some(children) => Ok(children
                .iter()
                .map(|(name, kind)| DirEntry {
                    name: name.clone(),
                    kind: *kind,
                })
                .collect()),
            None if self.files.contains_key(&key) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {key}"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {key}"),
            )),
        }
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let key = clean_start(path);
        match self.files.get(&key) {
            Some(data) => Ok(Box::new(*data)),
            None if self.dirs.contains_key(&key) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {key}"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {key}"),
            )),
        }
    }
}

/// Build a [`StaticStore`] from `"path" => bytes` pairs.
///
/// Evaluates to `io::Result<StaticStore>`. Byte values may be byte string
/// literals or `include_bytes!(...)`.
///
/// ```
/// use seedfs_kernel::static_store;
///
/// let store = static_store! {
///     "README.md" => b"# hello\n",
///     "data/" => b"",
/// }?;
/// assert_eq!(store.file_count(), 1);
/// # Ok::<(), std::io::Error>(())
/// ```
#[macro_export]
macro_rules! static_store {
    ($($path:expr => $bytes:expr),* $(,)?) => {
        $crate::StaticStore::new(&[$(($path, &$bytes[..])),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StaticStore {
        StaticStore::new(&[
            ("a/b.txt", b"b"),
            ("a/c/d.txt", b"d"),
            ("top.txt", b"top"),
            ("empty/", b""),
        ])
        .unwrap()
    }

    fn names(entries: Vec<DirEntry>) -> Vec<(String, EntryKind)> {
        entries.into_iter().map(|e| (e.name, e.kind)).collect()
    }

    #[test]
    fn test_root_listing_sorted() {
        let store = sample();
        assert_eq!(
            names(store.read_dir(".").unwrap()),
            vec![
                ("a".to_string(), EntryKind::Directory),
                ("empty".to_string(), EntryKind::Directory),
                ("top.txt".to_string(), EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_implied_directories() {
        let store = sample();
        assert_eq!(
            names(store.read_dir("a").unwrap()),
            vec![
                ("b.txt".to_string(), EntryKind::File),
                ("c".to_string(), EntryKind::Directory),
            ]
        );
        assert!(store.read_dir("empty").unwrap().is_empty());
    }

    #[test]
    fn test_open_file() {
        let store = sample();
        let mut buf = String::new();
        store.open("a/c/d.txt").unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "d");
    }

    #[test]
    fn test_backslash_lookup() {
        let store = sample();
        let mut buf = Vec::new();
        store.open(r"a\c\d.txt").unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"d");
        assert_eq!(store.read_dir(r"a\c").unwrap().len(), 1);
    }

    #[test]
    fn test_error_kinds() {
        let store = sample();
        assert_eq!(store.read_dir("nope").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(
            store.read_dir("top.txt").unwrap_err().kind(),
            io::ErrorKind::NotADirectory
        );
        assert_eq!(
            store.open("a").err().map(|e| e.kind()),
            Some(io::ErrorKind::IsADirectory)
        );
        assert_eq!(
            store.open("a/missing.txt").err().map(|e| e.kind()),
            Some(io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn test_file_dir_conflict() {
        let err = StaticStore::new(&[("a", b"file"), ("a/b.txt", b"nested")]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejects_parent_components() {
        let err = StaticStore::new(&[("a/../b.txt", b"x")]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_leading_slash_and_dot() {
        let store = StaticStore::new(&[("/x.txt", b"x"), ("./y/z.txt", b"z")]).unwrap();
        assert!(store.open("x.txt").is_ok());
        assert!(store.open("y/z.txt").is_ok());
    }

    #[test]
    fn test_macro() {
        let store = crate::static_store! {
            "one.txt" => b"1",
            "two/three.txt" => b"3",
        }
        .unwrap();
        let mut one = String::new();
        store.open("one.txt").unwrap().read_to_string(&mut one).unwrap();
        assert_eq!(one, "1");
        assert_eq!(store.read_dir("two").unwrap(), vec![DirEntry::file("three.txt")]);
        assert!(StaticStore::new(&[]).unwrap().read_dir(".").unwrap().is_empty());
    }
}
