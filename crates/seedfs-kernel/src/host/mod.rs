//! Host filesystem: the writable side of materialization.
//!
//! - **LocalFs**: the real OS filesystem
//! - **MemoryFs**: in-memory tree, for tests and `--dry-run`
//!
//! Policies only ever create directories, create (truncating) files, write
//! to them, and stat paths. Nothing is removed or renamed.

mod local;
mod memory;

pub use local::LocalFs;
pub use memory::MemoryFs;

use std::io::{self, Write};
use std::path::Path;

/// Mode for every directory a policy creates: `rwxr-xr-x`.
pub const DIR_MODE: u32 = 0o755;

/// Result of `HostFs::stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub is_dir: bool,
    pub is_file: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Unix permission bits, if the backend tracks them.
    pub permissions: Option<u32>,
}

/// Writable filesystem that embedded trees are projected onto.
pub trait HostFs {
    /// Create a directory and any missing ancestors.
    ///
    /// Succeeds if the directory already exists.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create a file for writing, truncating it if present.
    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Get metadata for a path.
    ///
    /// A missing path must fail with `io::ErrorKind::NotFound`; policies
    /// treat every other error as fatal.
    fn stat(&self, path: &Path) -> io::Result<Metadata>;
}

impl<T: HostFs + ?Sized> HostFs for &T {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).create_dir_all(path, mode)
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        (**self).create_file(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        (**self).stat(path)
    }
}
