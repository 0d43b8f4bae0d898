//! Embedded stores: the read-only side of materialization.
//!
//! - **StaticStore**: a tree built from compiled-in `(path, bytes)` pairs
//! - **DirStore**: a directory on disk, exposed read-only
//!
//! Both implement `seedfs_walk::EmbeddedFs` and report children sorted by name.

mod dir_store;
mod static_store;

pub use dir_store::DirStore;
pub use static_store::StaticStore;
