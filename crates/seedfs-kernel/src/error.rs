//! Materialization error types.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use seedfs_walk::WalkError;
use thiserror::Error;

/// Host filesystem operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    CreateDir,
    CreateFile,
    Write,
    Stat,
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostOp::CreateDir => "creating directory",
            HostOp::CreateFile => "creating file",
            HostOp::Write => "writing",
            HostOp::Stat => "checking",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while materializing an embedded tree.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Walking the embedded store failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// A host file collides with an embedded file (preflight conflict).
    #[error("file already exists: {}", .path.display())]
    AlreadyExists {
        /// Host path of the conflicting file.
        path: PathBuf,
    },

    /// An embedded file could not be opened.
    #[error("opening embedded file {path}: {source}")]
    Open {
        /// Store path of the embedded file.
        path: String,
        #[source]
        source: io::Error,
    },

    /// A host filesystem operation failed.
    #[error("{op} {}: {source}", .path.display())]
    Host {
        /// What was being done.
        op: HostOp,
        /// Host path it was done to.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MaterializeError {
    pub(crate) fn host(op: HostOp, path: &Path, source: io::Error) -> Self {
        MaterializeError::Host {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The closest standard `io::ErrorKind` for this error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            MaterializeError::Walk(e) => e.kind(),
            MaterializeError::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            MaterializeError::Open { source, .. } => source.kind(),
            MaterializeError::Host { source, .. } => source.kind(),
        }
    }

    /// True for the preflight conflict, or any host error of kind `AlreadyExists`.
    pub fn is_already_exists(&self) -> bool {
        self.kind() == io::ErrorKind::AlreadyExists
    }

    /// True when the source or a host path is missing, including `WalkError::NoFolder`.
    pub fn is_not_found(&self) -> bool {
        self.kind() == io::ErrorKind::NotFound
    }
}

impl From<MaterializeError> for io::Error {
    fn from(err: MaterializeError) -> Self {
        io::Error::new(err.kind(), err)
    }
}
