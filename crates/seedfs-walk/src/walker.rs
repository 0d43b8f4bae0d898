//! Level-order walker over an `EmbeddedFs`.
//!
//! `walk` never recurses. It keeps a queue of folders discovered on the
//! current level, descends into exactly that batch, then drops it and moves
//! on to whatever the batch discovered. Every directory is therefore fully
//! listed before any of its subdirectories are.

use std::collections::VecDeque;

use tracing::trace;

use crate::path::{clean_start, join_virtual, sanitize};
use crate::{EmbeddedEntry, EmbeddedFs, WalkError};

/// Deepest level `walk` will descend to before giving up.
///
/// Real compiled-in trees are nowhere near this; hitting it means the store
/// keeps reporting new directories forever.
pub const MAX_WALK_DEPTH: usize = 4096;

/// Apply `visit` to every immediate child of `path`.
///
/// The visitor receives the (sanitized) directory path and the entry. The
/// first visitor error is returned as-is; a listing failure comes back as
/// `WalkError::Io`. Does not descend into subdirectories.
pub fn walk_level<S, F, E>(store: &S, path: &str, mut visit: F) -> Result<(), E>
where
    S: EmbeddedFs + ?Sized,
    F: FnMut(&str, &S::Entry) -> Result<(), E>,
    E: From<WalkError>,
{
    let path = sanitize(path);
    let entries = store.read_dir(&path).map_err(WalkError::Io)?;
    for entry in &entries {
        visit(&path, entry)?;
    }
    Ok(())
}

/// Walk the whole tree below `start`, breadth first.
///
/// `visit` is called once for every file and directory, with the path of the
/// directory being scanned (`"."` for the store root) and the entry itself.
///
/// Errors:
/// - `start` cannot be listed: `WalkError::NoFolder`, and `visit` is never called.
/// - a deeper directory cannot be listed: `WalkError::Io` carrying the store's error.
/// - `visit` fails: that exact error, with no wrapping.
pub fn walk<S, F, E>(store: &S, start: &str, mut visit: F) -> Result<(), E>
where
    S: EmbeddedFs + ?Sized,
    F: FnMut(&str, &S::Entry) -> Result<(), E>,
    E: From<WalkError>,
{
    let start = clean_start(start);
    let mut folders: VecDeque<String> = VecDeque::new();

    let entries = store.read_dir(&start).map_err(|source| WalkError::NoFolder {
        path: start.clone(),
        source,
    })?;
    visit_entries(&start, &entries, &mut folders, &mut visit)?;

    let mut depth = 1;
    while !folders.is_empty() {
        if depth > MAX_WALK_DEPTH {
            let path = folders.pop_front().unwrap_or_default();
            return Err(WalkError::TooDeep {
                path,
                limit: MAX_WALK_DEPTH,
            }
            .into());
        }

        // Only the folders queued before this level started; anything found
        // while scanning them waits for the next round.
        let n = folders.len();
        trace!(depth, folders = n, "walking level");
        for _ in 0..n {
            let Some(dir) = folders.pop_front() else {
                break;
            };
            let entries = store.read_dir(&dir).map_err(WalkError::Io)?;
            visit_entries(&dir, &entries, &mut folders, &mut visit)?;
        }
        depth += 1;
    }

    Ok(())
}

fn visit_entries<T, F, E>(
    dir: &str,
    entries: &[T],
    folders: &mut VecDeque<String>,
    visit: &mut F,
) -> Result<(), E>
where
    T: EmbeddedEntry,
    F: FnMut(&str, &T) -> Result<(), E>,
    E: From<WalkError>,
{
    for entry in entries {
        check_name(dir, entry.name())?;
        if entry.is_dir() {
            folders.push_back(join_virtual(dir, entry.name()));
        }
        visit(dir, entry)?;
    }
    Ok(())
}

/// A child name must address exactly one new node below its parent.
fn check_name(dir: &str, name: &str) -> Result<(), WalkError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(WalkError::InvalidName {
            dir: dir.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}
