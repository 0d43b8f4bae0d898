//! seedfs-kernel: project a read-only embedded tree onto a writable filesystem.
//!
//! This crate provides:
//!
//! - **Policies**: `structure`, `stub`, `overwrite`, `conservative_create`
//!   and `preflight_create`, each a visitor driven by `seedfs_walk::walk`
//! - **Host filesystems**: the `HostFs` trait, with `LocalFs` (the real OS
//!   filesystem) and `MemoryFs` (in-memory, for tests and dry runs)
//! - **Embedded stores**: `StaticStore` (compiled-in byte tables) and
//!   `DirStore` (a directory on disk, read-only)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use seedfs_kernel::{conservative_create, static_store, LocalFs};
//!
//! let store = static_store! {
//!     "config/app.toml" => b"name = \"demo\"\n",
//!     "logs/" => b"",
//! }?;
//! conservative_create(&store, &LocalFs, Path::new("/tmp/demo"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod host;
mod materialize;
pub mod store;

pub use error::{HostOp, MaterializeError};
pub use host::{HostFs, LocalFs, MemoryFs, Metadata, DIR_MODE};
pub use materialize::{
    conservative_create, materialize_to_dir, overwrite, preflight_create, structure, stub,
    MaterializeSummary, ParsePolicyError, Policy,
};
pub use store::{DirStore, StaticStore};

pub use seedfs_walk::{
    join_virtual, sanitize, walk, walk_level, DirEntry, EmbeddedEntry, EmbeddedFs, EntryKind,
    WalkError,
};
