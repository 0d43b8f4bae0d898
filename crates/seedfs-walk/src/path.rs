//! Virtual path helpers.
//!
//! Store paths always use `/`. Paths assembled on a host that separates with
//! `\` have to pass through `sanitize` before they are used as store keys.

use std::borrow::Cow;

/// The store root.
pub const ROOT: &str = ".";

/// Convert host-native separators to the store's forward slashes.
pub fn sanitize(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Normalize a caller-supplied start path.
///
/// Sanitizes separators, drops trailing slashes and a leading `./`, and maps
/// the empty path to `"."`.
pub fn clean_start(path: &str) -> String {
    let path = sanitize(path);
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    if trimmed.is_empty() {
        ROOT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join a directory path and an entry name.
///
/// Joining onto the root yields the bare name, so paths never start with `./`.
pub fn join_virtual(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir == ROOT {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}
