//! CLI configuration.
//!
//! | Purpose | XDG Variable | Default | seedfs Path |
//! |---------|--------------|---------|-------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/seedfs/config.toml` |
//!
//! ```toml
//! policy = "conservative-create"
//! dest = "./site"
//! log = "seedfs=debug"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use seedfs_kernel::Policy;
use serde::Deserialize;

/// Settings read from `config.toml`. Command-line flags win over these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Policy used by `seedfs apply` when `--policy` is not given.
    pub policy: Policy,
    /// Destination used when none is given on the command line.
    pub dest: Option<PathBuf>,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub log: Option<String>,
}

impl Config {
    /// Get the default config file path.
    ///
    /// Uses `$XDG_CONFIG_HOME/seedfs/config.toml` or falls back to
    /// `~/.config/seedfs/config.toml`.
    pub fn default_path() -> PathBuf {
        BaseDirs::new()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("seedfs")
            .join("config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is tried
    /// and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Destination to use: the command-line one, else the configured one, else `.`.
    pub fn resolve_dest(&self, cli_dest: Option<&Path>) -> PathBuf {
        cli_dest
            .map(Path::to_path_buf)
            .or_else(|| self.dest.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.policy, Policy::ConservativeCreate);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            policy = "overwrite"
            dest = "out"
            log = "seedfs=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.policy, Policy::Overwrite);
        assert_eq!(config.dest, Some(PathBuf::from("out")));
        assert_eq!(config.log.as_deref(), Some("seedfs=debug"));
    }

    #[test]
    fn test_policy_alias() {
        let config = Config::from_toml(r#"policy = "patch""#).unwrap();
        assert_eq!(config.policy, Policy::ConservativeCreate);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml("mode = 0o777").is_err());
        assert!(Config::from_toml(r#"policy = "sideways""#).is_err());
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config"));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "policy = \"stub\"\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().policy, Policy::Stub);
    }

    #[test]
    fn test_resolve_dest() {
        let config = Config {
            dest: Some(PathBuf::from("configured")),
            ..Default::default()
        };
        assert_eq!(config.resolve_dest(Some(Path::new("cli"))), PathBuf::from("cli"));
        assert_eq!(config.resolve_dest(None), PathBuf::from("configured"));
        assert_eq!(Config::default().resolve_dest(None), PathBuf::from("."));
    }
}
