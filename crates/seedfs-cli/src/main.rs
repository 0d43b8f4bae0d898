//! seedfs entry point.
//!
//! ```bash
//! seedfs conservative-create ./templates ./site
//! seedfs list ./templates
//! ```

use anyhow::{Context, Result};
use clap::Parser;

use seedfs_cli::{Cli, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing (respects RUST_LOG env var)
    seedfs_cli::init_tracing(cli.verbose, config.log.as_deref())?;

    let stdout = std::io::stdout();
    seedfs_cli::run(&cli, &config, &mut stdout.lock())
}
