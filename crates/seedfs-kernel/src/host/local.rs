//! Local filesystem backend.

use super::{HostFs, Metadata};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// The real filesystem.
///
/// Paths are used as given; callers join them onto their destination root.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Extract permissions from std::fs::Metadata (unix only).
    #[cfg(unix)]
    fn extract_permissions(meta: &fs::Metadata) -> Option<u32> {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    fn extract_permissions(_meta: &fs::Metadata) -> Option<u32> {
        None
    }
}

impl HostFs for LocalFs {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let file = fs::File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let meta = fs::metadata(path)?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            permissions: Self::extract_permissions(&meta),
        })
    }
}
