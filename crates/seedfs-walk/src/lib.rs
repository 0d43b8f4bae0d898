//! seedfs-walk: breadth-first walking of embedded file trees.
//!
//! Provides:
//! - **EmbeddedFs**: Minimal read-only store trait (list a directory, open a file)
//! - **walk_level**: Visit the immediate children of one directory
//! - **walk**: Level-order traversal of a whole tree, without recursion
//! - **sanitize / join_virtual**: Forward-slash path handling for store lookups
//!
//! The walker is generic over `EmbeddedFs`. Consumers implement it to adapt
//! whatever holds their compiled-in tree (static byte tables, archives, a
//! directory on disk) and then drive `walk` with a visitor closure.

mod path;
mod walker;

pub use path::{clean_start, join_virtual, sanitize, ROOT};
pub use walker::{walk, walk_level, MAX_WALK_DEPTH};

use std::io::{self, Read};
use thiserror::Error;

/// Errors raised by the walker itself.
///
/// Visitor errors never pass through this type: `walk` returns them
/// untouched, so callers can match on their own sentinel values.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The start path could not be listed at all.
    #[error("no folder found at {path:?}: {source}")]
    NoFolder {
        path: String,
        #[source]
        source: io::Error,
    },
    /// A directory discovered mid-walk could not be listed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The store reported a child whose name would break path addressing.
    #[error("invalid entry name {name:?} in {dir:?}")]
    InvalidName { dir: String, name: String },
    /// The tree is deeper than any real embedded tree should be.
    #[error("walk exceeded {limit} levels at {path:?}")]
    TooDeep { path: String, limit: usize },
}

impl WalkError {
    /// True if the error means "this path does not exist in the store".
    pub fn is_not_found(&self) -> bool {
        match self {
            WalkError::NoFolder { .. } => true,
            WalkError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The closest `io::ErrorKind` for this error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            WalkError::NoFolder { .. } => io::ErrorKind::NotFound,
            WalkError::Io(e) => e.kind(),
            WalkError::InvalidName { .. } => io::ErrorKind::InvalidData,
            WalkError::TooDeep { .. } => io::ErrorKind::InvalidData,
        }
    }
}

/// Read-only embedded filesystem.
///
/// Paths are forward-slash delimited and relative to the store's implicit
/// top level; `"."` names the root. Implementations should report a missing
/// path as `io::ErrorKind::NotFound` and listing a file as
/// `io::ErrorKind::NotADirectory`.
pub trait EmbeddedFs {
    /// The directory entry type returned by `read_dir`.
    type Entry: EmbeddedEntry;

    /// List the immediate children of a directory.
    ///
    /// The order returned here is the order `walk` visits siblings in.
    fn read_dir(&self, path: &str) -> io::Result<Vec<Self::Entry>>;

    /// Open a file for reading its full contents.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;
}

impl<T: EmbeddedFs + ?Sized> EmbeddedFs for &T {
    type Entry = T::Entry;

    fn read_dir(&self, path: &str) -> io::Result<Vec<Self::Entry>> {
        (**self).read_dir(path)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        (**self).open(path)
    }
}

/// A single entry returned by `EmbeddedFs::read_dir`.
pub trait EmbeddedEntry {
    /// The entry's own name (not its full path).
    fn name(&self) -> &str;

    /// True if this entry is a directory.
    fn is_dir(&self) -> bool;

    /// True if this entry is a regular file.
    fn is_file(&self) -> bool {
        !self.is_dir()
    }
}

/// Kind of embedded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Owned directory entry, the common `EmbeddedEntry` used by the bundled stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Kind of entry.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Create a new file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }
}

impl EmbeddedEntry for DirEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
