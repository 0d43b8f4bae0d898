//! Materialization policies.
//!
//! Every policy is one `walk` over the embedded store from its root. The
//! visitor mirrors each directory at `dest` and then does something policy
//! specific with each file:
//!
//! | Policy | Files |
//! |--------|-------|
//! | `structure` | nothing |
//! | `stub` | empty file, only where nothing exists yet |
//! | `overwrite` | full content, always |
//! | `conservative_create` | full content, only where nothing exists yet |
//! | `preflight_create` | refuse if any file exists, else `conservative_create` |
//!
//! Failures stop the walk where it is. Whatever was already created stays.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use seedfs_walk::{join_virtual, sanitize, walk, EmbeddedEntry, EmbeddedFs, ROOT};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{HostOp, MaterializeError};
use crate::host::{HostFs, LocalFs, DIR_MODE};

/// What a successful policy run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Directories ensured at the destination.
    pub dirs: usize,
    /// Files created, stubbed, or overwritten.
    pub files_written: usize,
    /// Files left alone.
    pub files_skipped: usize,
}

impl fmt::Display for MaterializeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directories, {} files written, {} files skipped",
            self.dirs, self.files_written, self.files_skipped
        )
    }
}

/// How a materialization pass treats embedded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Ignore,
    TouchIfAbsent,
    Copy,
    CopyIfAbsent,
}

/// Create the directory structure only.
pub fn structure<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    project(store, host, dest, Policy::Structure, FileAction::Ignore)
}

/// Create the directory structure plus an empty file for every embedded
/// file that does not exist yet. Existing files are untouched.
pub fn stub<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    project(store, host, dest, Policy::Stub, FileAction::TouchIfAbsent)
}

/// Write every embedded file, replacing whatever is at the destination.
pub fn overwrite<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    project(store, host, dest, Policy::Overwrite, FileAction::Copy)
}

/// Write only the embedded files missing at the destination.
pub fn conservative_create<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    project(store, host, dest, Policy::ConservativeCreate, FileAction::CopyIfAbsent)
}

/// Recreate the tree, but only if no embedded file already exists at the
/// destination.
///
/// The conflict check covers the whole tree before anything is written;
/// the first conflict fails with `MaterializeError::AlreadyExists`.
/// Directories never conflict.
pub fn preflight_create<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    walk(store, ROOT, |dir: &str, entry: &S::Entry| -> Result<(), MaterializeError> {
        if entry.is_dir() {
            return Ok(());
        }
        let target = dest.join(join_virtual(dir, entry.name()));
        if is_absent(host, &target)? {
            Ok(())
        } else {
            warn!(path = %target.display(), "preflight conflict");
            Err(MaterializeError::AlreadyExists { path: target })
        }
    })?;
    conservative_create(store, host, dest)
}

/// Apply `policy` to a real directory.
pub fn materialize_to_dir<S>(
    policy: Policy,
    store: &S,
    dest: impl AsRef<Path>,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
{
    policy.apply(store, &LocalFs, dest.as_ref())
}

fn project<S, H>(
    store: &S,
    host: &H,
    dest: &Path,
    policy: Policy,
    action: FileAction,
) -> Result<MaterializeSummary, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    info!(%policy, dest = %dest.display(), "materializing");
    let mut summary = MaterializeSummary::default();
    // Top-level files come before any directory in walk order, so the
    // destination root has to exist before the first file is created.
    let mut root_ready = false;

    walk(store, ROOT, |dir: &str, entry: &S::Entry| -> Result<(), MaterializeError> {
        let rel = join_virtual(dir, entry.name());
        let target = dest.join(&rel);

        if entry.is_dir() {
            host.create_dir_all(&target, DIR_MODE)
                .map_err(|e| MaterializeError::host(HostOp::CreateDir, &target, e))?;
            debug!(path = %target.display(), "directory");
            summary.dirs += 1;
            return Ok(());
        }

        let write = match action {
            FileAction::Ignore => false,
            FileAction::Copy => true,
            FileAction::TouchIfAbsent | FileAction::CopyIfAbsent => is_absent(host, &target)?,
        };
        if !write {
            debug!(path = %target.display(), "skipped");
            summary.files_skipped += 1;
            return Ok(());
        }

        if !root_ready {
            host.create_dir_all(dest, DIR_MODE)
                .map_err(|e| MaterializeError::host(HostOp::CreateDir, dest, e))?;
            root_ready = true;
        }

        if action == FileAction::TouchIfAbsent {
            let mut sink = host
                .create_file(&target)
                .map_err(|e| MaterializeError::host(HostOp::CreateFile, &target, e))?;
            sink.flush().map_err(|e| MaterializeError::host(HostOp::Write, &target, e))?;
            debug!(path = %target.display(), "stubbed");
        } else {
            let bytes = copy_embedded(store, &rel, host, &target)?;
            debug!(path = %target.display(), bytes, "written");
        }
        summary.files_written += 1;
        Ok(())
    })?;

    info!(%policy, %summary, "materialized");
    Ok(summary)
}

/// True if nothing exists at `target`. Stat failures other than
/// "not found" are errors, not absence.
fn is_absent<H: HostFs + ?Sized>(host: &H, target: &Path) -> Result<bool, MaterializeError> {
    match host.stat(target) {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(MaterializeError::host(HostOp::Stat, target, e)),
    }
}

/// Stream an embedded file into a freshly created (truncated) host file.
fn copy_embedded<S, H>(
    store: &S,
    rel: &str,
    host: &H,
    target: &Path,
) -> Result<u64, MaterializeError>
where
    S: EmbeddedFs + ?Sized,
    H: HostFs + ?Sized,
{
    let rel = sanitize(rel);
    let mut reader = store.open(&rel).map_err(|source| MaterializeError::Open {
        path: rel.to_string(),
        source,
    })?;
    let mut sink = host
        .create_file(target)
        .map_err(|e| MaterializeError::host(HostOp::CreateFile, target, e))?;
    let bytes = io::copy(&mut reader, &mut sink)
        .map_err(|e| MaterializeError::host(HostOp::Write, target, e))?;
    sink.flush().map_err(|e| MaterializeError::host(HostOp::Write, target, e))?;
    Ok(bytes)
}

/// A materialization policy, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    #[serde(alias = "tree")]
    Structure,
    #[serde(alias = "touch")]
    Stub,
    #[serde(alias = "write")]
    Overwrite,
    #[default]
    #[serde(alias = "patch")]
    ConservativeCreate,
    #[serde(alias = "create")]
    PreflightCreate,
}

impl Policy {
    /// Every policy, in order of increasing caution about existing files.
    pub const ALL: [Policy; 5] = [
        Policy::Structure,
        Policy::Stub,
        Policy::Overwrite,
        Policy::ConservativeCreate,
        Policy::PreflightCreate,
    ];

    /// The policy's canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Structure => "structure",
            Policy::Stub => "stub",
            Policy::Overwrite => "overwrite",
            Policy::ConservativeCreate => "conservative-create",
            Policy::PreflightCreate => "preflight-create",
        }
    }

    /// True if the policy ever replaces an existing file's content.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Policy::Overwrite)
    }

    /// Run this policy.
    pub fn apply<S, H>(
        &self,
        store: &S,
        host: &H,
        dest: &Path,
    ) -> Result<MaterializeSummary, MaterializeError>
    where
        S: EmbeddedFs + ?Sized,
        H: HostFs + ?Sized,
    {
        match self {
            Policy::Structure => structure(store, host, dest),
            Policy::Stub => stub(store, host, dest),
            Policy::Overwrite => overwrite(store, host, dest),
            Policy::ConservativeCreate => conservative_create(store, host, dest),
            Policy::PreflightCreate => preflight_create(store, host, dest),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown policy name.
#[derive(Debug, Clone, Error)]
#[error("unknown policy {0:?} (expected structure, stub, overwrite, conservative-create or preflight-create)")]
pub struct ParsePolicyError(String);

impl FromStr for Policy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "structure" | "tree" => Ok(Policy::Structure),
            "stub" | "touch" => Ok(Policy::Stub),
            "overwrite" | "write" => Ok(Policy::Overwrite),
            "conservative-create" | "patch" => Ok(Policy::ConservativeCreate),
            "preflight-create" | "create" => Ok(Policy::PreflightCreate),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
