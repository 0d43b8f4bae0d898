//! seedfs command line.
//!
//! Materializes a source directory onto a destination with one of the
//! seedfs policies. The source is read through `DirStore`, so the result is
//! exactly what a binary embedding the same tree would produce.

pub mod config;

pub use config::Config;

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use seedfs_kernel::{
    join_virtual, walk, DirEntry, DirStore, EmbeddedEntry, LocalFs, MemoryFs, Policy, WalkError,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Materialize a file tree onto disk.
#[derive(Debug, Parser)]
#[command(name = "seedfs", version, about)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/seedfs/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the directory structure only.
    #[command(alias = "tree")]
    Structure(ApplyArgs),
    /// Create directories and empty files; existing files are kept.
    #[command(alias = "touch")]
    Stub(ApplyArgs),
    /// Write every file, replacing existing content.
    #[command(alias = "write")]
    Overwrite(ApplyArgs),
    /// Write only files that do not exist yet.
    #[command(alias = "patch")]
    ConservativeCreate(ApplyArgs),
    /// Write everything, but refuse if any file already exists.
    #[command(alias = "create")]
    PreflightCreate(ApplyArgs),
    /// Apply the configured policy (or --policy).
    Apply {
        #[arg(long)]
        policy: Option<Policy>,
        #[command(flatten)]
        args: ApplyArgs,
    },
    /// Print the walk order of a source tree.
    List {
        source: PathBuf,
        /// Path inside the source to start from.
        #[arg(long, default_value = ".")]
        start: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Directory holding the tree to materialize.
    pub source: PathBuf,
    /// Destination root (default: config `dest`, else the current directory).
    pub dest: Option<PathBuf>,
    /// Materialize into memory and report, without touching disk.
    #[arg(long)]
    pub dry_run: bool,
}

impl Command {
    /// The policy and arguments for a materializing command.
    fn materialize(&self, config: &Config) -> Option<(Policy, &ApplyArgs)> {
        match self {
            Command::Structure(args) => Some((Policy::Structure, args)),
            Command::Stub(args) => Some((Policy::Stub, args)),
            Command::Overwrite(args) => Some((Policy::Overwrite, args)),
            Command::ConservativeCreate(args) => Some((Policy::ConservativeCreate, args)),
            Command::PreflightCreate(args) => Some((Policy::PreflightCreate, args)),
            Command::Apply { policy, args } => Some((policy.unwrap_or(config.policy), args)),
            Command::List { .. } => None,
        }
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `-v` flags, then the config's `log`, then
/// `seedfs=info`.
pub fn init_tracing(verbose: u8, config_filter: Option<&str>) -> Result<()> {
    let filter = match (std::env::var("RUST_LOG"), verbose) {
        (Ok(_), _) => EnvFilter::from_default_env(),
        (Err(_), 0) => EnvFilter::try_new(config_filter.unwrap_or("seedfs=info"))
            .context("Invalid log filter in config")?,
        (Err(_), 1) => EnvFilter::new("seedfs=debug"),
        (Err(_), _) => EnvFilter::new("seedfs=trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Execute a parsed command line, writing user-facing output to `out`.
pub fn run(cli: &Cli, config: &Config, out: &mut dyn Write) -> Result<()> {
    if let Command::List { source, start } = &cli.command {
        return list(source, start, out);
    }
    let Some((policy, args)) = cli.command.materialize(config) else {
        return Ok(());
    };

    let store = DirStore::new(&args.source);
    let dest = config.resolve_dest(args.dest.as_deref());
    check_overlap(store.root(), &dest)?;
    tracing::info!("{} {} -> {}", policy, store.root().display(), dest.display());

    if args.dry_run {
        let host = MemoryFs::new();
        let summary = policy
            .apply(&store, &host, &dest)
            .with_context(|| format!("{policy} failed (dry run)"))?;
        for rel in host.paths_under(&dest)? {
            writeln!(out, "{}", dest.join(rel).display())?;
        }
        writeln!(out, "{policy} (dry run): {summary}")?;
        return Ok(());
    }

    if policy.is_destructive() {
        tracing::warn!("{policy} replaces existing files under {}", dest.display());
    }
    let summary = policy
        .apply(&store, &LocalFs, &dest)
        .with_context(|| format!("{policy} into {} failed", dest.display()))?;
    writeln!(out, "{policy}: {summary}")?;
    Ok(())
}

/// Refuse a destination that would write into the source tree.
///
/// A destination equal to or inside the source is always rejected. A source
/// inside the destination is rejected only when the tree holds its own
/// relative path, so some target lands back in the source.
fn check_overlap(source: &Path, dest: &Path) -> Result<()> {
    // A missing source is reported by the walk.
    let Ok(source) = source.canonicalize() else {
        return Ok(());
    };
    let dest = canonical_target(dest)?;

    if dest.starts_with(&source) {
        bail!("destination {} is inside source {}", dest.display(), source.display());
    }
    if let Ok(tail) = source.strip_prefix(&dest) {
        if source.join(tail).exists() {
            bail!(
                "source {} would be written into itself through {}",
                source.display(),
                dest.display()
            );
        }
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
///
/// The deepest existing ancestor is canonicalized and the missing tail is
/// appended to it.
fn canonical_target(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut missing = Vec::new();
    let mut existing = lexical.as_path();
    loop {
        if let Ok(base) = existing.canonicalize() {
            return Ok(missing.iter().rev().fold(base, |acc, name| acc.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(lexical),
        }
    }
}

/// Print every entry below `start`, in walk order.
fn list(source: &Path, start: &str, out: &mut dyn Write) -> Result<()> {
    let store = DirStore::new(source);
    let mut lines = Vec::new();
    walk(&store, start, |dir, entry: &DirEntry| {
        let mut line = join_virtual(dir, entry.name());
        if entry.is_dir() {
            line.push('/');
        }
        lines.push(line);
        Ok::<_, WalkError>(())
    })
    .with_context(|| format!("Failed to walk {}", store.root().display()))?;

    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
