//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Data-dir config.kdl (`<data_dir>/config.kdl`)
//! 3. System config.kdl (`$BEARING_CONFIG_DIR/config.kdl` or
//!    `~/.config/bearing/config.kdl`)
//! 4. Built-in defaults

use super::schema::{BearingConfig, OutputFormat};
use super::{data_config_path, read_config_file, system_config_path};
use crate::rules::RuleEngine;
use crate::storage::GitIdentity;
use crate::{Error, Result};
use std::path::Path;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from the data directory's config.kdl
    DataDir,
    /// Value from the system config.kdl
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::DataDir => write!(f, "data-dir"),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub git_author_name: Resolved<String>,
    pub git_author_email: Resolved<String>,
    /// Unset means no WIP limit
    pub doing_wip_limit: Option<Resolved<u32>>,
    pub log_level: Resolved<String>,
    pub output_format: Resolved<OutputFormat>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let identity = GitIdentity::default();
        Self {
            git_author_name: Resolved::new(identity.name, ValueSource::Default),
            git_author_email: Resolved::new(identity.email, ValueSource::Default),
            doing_wip_limit: None,
            log_level: Resolved::new("warn".to_string(), ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Commit identity for the versioned store.
    pub fn identity(&self) -> GitIdentity {
        GitIdentity {
            name: self.git_author_name.value.clone(),
            email: self.git_author_email.value.clone(),
        }
    }

    /// Default rules plus the WIP limit, when configured.
    pub fn rule_engine(&self) -> RuleEngine {
        RuleEngine::default()
            .with_wip_limit(self.doing_wip_limit.as_ref().map(|r| r.value as usize))
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn log_level(&self) -> &str {
        &self.log_level.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub log_level: Option<String>,
    pub doing_wip_limit: Option<u32>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_doing_wip_limit(mut self, limit: u32) -> Self {
        self.doing_wip_limit = Some(limit);
        self
    }
}

/// Pick the highest-precedence value among CLI, data-dir, and system.
fn pick<T: Clone>(cli: Option<&T>, data: Option<&T>, system: Option<&T>) -> Option<Resolved<T>> {
    cli.map(|v| Resolved::new(v.clone(), ValueSource::CliFlag))
        .or_else(|| data.map(|v| Resolved::new(v.clone(), ValueSource::DataDir)))
        .or_else(|| system.map(|v| Resolved::new(v.clone(), ValueSource::System)))
}

/// Resolve configuration for a data directory with full precedence chain.
pub fn resolve_config(data_dir: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let system = match system_config_path() {
        Some(path) => read_config_file(&path)?,
        None => BearingConfig::default(),
    };
    let data = read_config_file(&data_config_path(data_dir))?;
    resolve_from(&system, &data, overrides)
}

/// Resolve from already-loaded layers.
pub fn resolve_from(
    system: &BearingConfig,
    data: &BearingConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    system
        .validate()
        .map_err(|e| Error::Config(format!("system config: {}", e)))?;
    data.validate()
        .map_err(|e| Error::Config(format!("data-dir config: {}", e)))?;

    let mut result = ResolvedConfig::default();

    if let Some(name) = pick(
        None,
        data.git_author_name.as_ref(),
        system.git_author_name.as_ref(),
    ) {
        result.git_author_name = name;
    }
    if let Some(email) = pick(
        None,
        data.git_author_email.as_ref(),
        system.git_author_email.as_ref(),
    ) {
        result.git_author_email = email;
    }

    result.doing_wip_limit = pick(
        overrides.doing_wip_limit.as_ref(),
        data.doing_wip_limit.as_ref(),
        system.doing_wip_limit.as_ref(),
    );
    if let Some(Resolved { value: 0, .. }) = result.doing_wip_limit {
        return Err(Error::Config("doing-wip-limit must be at least 1".to_string()));
    }

    if let Some(level) = pick(
        overrides.log_level.as_ref(),
        data.log_level.as_ref(),
        system.log_level.as_ref(),
    ) {
        result.log_level = level;
    }
    if let Some(format) = pick(
        overrides.output_format.as_ref(),
        data.output_format.as_ref(),
        system.output_format.as_ref(),
    ) {
        result.output_format = format;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BEARING_CONFIG_DIR_ENV, write_config_file};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_value_source_display() {
        assert_eq!(format!("{}", ValueSource::DataDir), "data-dir");
        assert_eq!(format!("{}", ValueSource::System), "system");
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    #[test]
    fn test_resolve_defaults() {
        let config = resolve_from(
            &BearingConfig::default(),
            &BearingConfig::default(),
            &ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.identity(), GitIdentity::default());
        assert_eq!(config.git_author_name.source, ValueSource::Default);
        assert!(config.doing_wip_limit.is_none());
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.rule_engine(), RuleEngine::default());
    }

    #[test]
    fn test_data_dir_overrides_system() {
        let system = BearingConfig {
            git_author_name: Some("System".to_string()),
            doing_wip_limit: Some(5),
            ..Default::default()
        };
        let data = BearingConfig {
            git_author_name: Some("Data".to_string()),
            ..Default::default()
        };
        let config = resolve_from(&system, &data, &ConfigOverrides::default()).unwrap();

        assert_eq!(config.git_author_name.value, "Data");
        assert_eq!(config.git_author_name.source, ValueSource::DataDir);
        let limit = config.doing_wip_limit.as_ref().unwrap();
        assert_eq!(limit.value, 5);
        assert_eq!(limit.source, ValueSource::System);
        assert_eq!(config.rule_engine().rules().len(), RuleEngine::default().rules().len() + 1);
    }

    #[test]
    fn test_cli_overrides_files() {
        let data = BearingConfig {
            output_format: Some(OutputFormat::Json),
            log_level: Some("info".to_string()),
            doing_wip_limit: Some(2),
            ..Default::default()
        };
        let overrides = ConfigOverrides::new()
            .with_output_format(OutputFormat::Human)
            .with_log_level("debug")
            .with_doing_wip_limit(4);
        let config = resolve_from(&BearingConfig::default(), &data, &overrides).unwrap();

        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::CliFlag);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.doing_wip_limit.unwrap().value, 4);
    }

    #[test]
    fn test_invalid_layer_is_config_error() {
        let data = BearingConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        let err = resolve_from(&BearingConfig::default(), &data, &ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.starts_with("data-dir config")));

        let zero = ConfigOverrides::new().with_doing_wip_limit(0);
        assert!(resolve_from(&BearingConfig::default(), &BearingConfig::default(), &zero).is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_config_reads_both_files() {
        let system_dir = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();

        // SAFETY: serialized with every other test touching this variable
        unsafe { std::env::set_var(BEARING_CONFIG_DIR_ENV, system_dir.path()) };

        write_config_file(
            &system_dir.path().join("config.kdl"),
            &BearingConfig {
                git_author_email: Some("me@example.com".to_string()),
                output_format: Some(OutputFormat::Human),
                ..Default::default()
            },
        )
        .unwrap();
        write_config_file(
            &data_config_path(data_dir.path()),
            &BearingConfig {
                output_format: Some(OutputFormat::Json),
                ..Default::default()
            },
        )
        .unwrap();

        let config = resolve_config(data_dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.git_author_email.value, "me@example.com");
        assert_eq!(config.git_author_email.source, ValueSource::System);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::DataDir);

        unsafe { std::env::remove_var(BEARING_CONFIG_DIR_ENV) };
    }
}
