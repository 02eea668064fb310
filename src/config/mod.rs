//! Configuration for Bearing.
//!
//! Settings live in `config.kdl` files:
//! - System: `$BEARING_CONFIG_DIR/config.kdl`, else `~/.config/bearing/config.kdl`
//! - Data dir: `<data_dir>/config.kdl` (ignored by version history)
//!
//! Contains:
//! - `git-author-name` / `git-author-email` - identity on planning commits
//! - `doing-wip-limit` - maximum tasks in the doing column
//! - `log-level` - default tracing level
//! - `output-format` - "json" or "human"
//!
//! ## Precedence
//!
//! CLI flag > data-dir config > system config > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve_config};
pub use schema::{BearingConfig, OutputFormat};

use crate::storage::CONFIG_FILE;
use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the system config directory.
pub const BEARING_CONFIG_DIR_ENV: &str = "BEARING_CONFIG_DIR";

/// Directory holding the system config file, if one can be determined.
pub fn system_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(BEARING_CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::config_dir().map(|d| d.join("bearing"))
}

pub fn system_config_path() -> Option<PathBuf> {
    system_config_dir().map(|d| d.join(CONFIG_FILE))
}

pub fn data_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read a config file. A missing file is an empty config.
pub fn read_config_file(path: &Path) -> Result<BearingConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BearingConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(BearingConfig::from_kdl(&doc))
}

/// Write a config file, creating its directory.
pub fn write_config_file(path: &Path, config: &BearingConfig) -> Result<()> {
    config.validate().map_err(Error::Config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_kdl().to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_config() {
        let temp = TempDir::new().unwrap();
        let config = read_config_file(&temp.path().join("config.kdl")).unwrap();
        assert_eq!(config, BearingConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");
        fs::write(&path, "output-format \"json").unwrap();
        assert!(matches!(read_config_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.kdl");
        let config = BearingConfig {
            doing_wip_limit: Some(3),
            ..Default::default()
        };
        write_config_file(&path, &config).unwrap();
        assert_eq!(read_config_file(&path).unwrap(), config);
    }

    #[test]
    fn test_write_rejects_invalid() {
        let temp = TempDir::new().unwrap();
        let config = BearingConfig {
            doing_wip_limit: Some(0),
            ..Default::default()
        };
        assert!(write_config_file(&temp.path().join("config.kdl"), &config).is_err());
    }
}
