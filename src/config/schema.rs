//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The `BearingConfig` struct mirroring the file
//! - Conversion to and from `KdlDocument`
//! - Validation

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log levels accepted in `log-level`.
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Settings stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// git-author-name "Ada"
/// git-author-email "ada@example.com"
/// doing-wip-limit 3
/// log-level "info"
/// output-format "human"  // or "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearingConfig {
    /// Author name on planning commits
    pub git_author_name: Option<String>,

    /// Author email on planning commits
    pub git_author_email: Option<String>,

    /// Maximum number of tasks in the doing column
    pub doing_wip_limit: Option<u32>,

    /// Default tracing level
    pub log_level: Option<String>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl BearingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.doing_wip_limit == Some(0) {
            return Err("doing-wip-limit must be at least 1".to_string());
        }
        if let Some(ref level) = self.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(format!(
                    "log-level must be one of {}, got {}",
                    LOG_LEVELS.join("|"),
                    level
                ));
            }
        }
        for (key, value) in [
            ("git-author-name", &self.git_author_name),
            ("git-author-email", &self.git_author_email),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(format!("{} cannot be empty", key));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes and values of the
    /// wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            git_author_name: first_string(doc, "git-author-name"),
            git_author_email: first_string(doc, "git-author-email"),
            doing_wip_limit: first_integer(doc, "doing-wip-limit")
                .and_then(|i| u32::try_from(i).ok())
                .filter(|limit| *limit > 0),
            log_level: first_string(doc, "log-level"),
            output_format: first_string(doc, "output-format")
                .as_deref()
                .and_then(OutputFormat::parse),
        }
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref name) = self.git_author_name {
            push_node(&mut doc, "git-author-name", KdlValue::String(name.clone()));
        }
        if let Some(ref email) = self.git_author_email {
            push_node(&mut doc, "git-author-email", KdlValue::String(email.clone()));
        }
        if let Some(limit) = self.doing_wip_limit {
            push_node(&mut doc, "doing-wip-limit", KdlValue::Integer(limit as i128));
        }
        if let Some(ref level) = self.log_level {
            push_node(&mut doc, "log-level", KdlValue::String(level.clone()));
        }
        if let Some(format) = self.output_format {
            push_node(
                &mut doc,
                "output-format",
                KdlValue::String(format.as_str().to_string()),
            );
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &BearingConfig) {
        if other.git_author_name.is_some() {
            self.git_author_name = other.git_author_name.clone();
        }
        if other.git_author_email.is_some() {
            self.git_author_email = other.git_author_email.clone();
        }
        if other.doing_wip_limit.is_some() {
            self.doing_wip_limit = other.doing_wip_limit;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level.clone();
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
    }
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)?
        .entries()
        .first()?
        .value()
        .as_string()
        .map(str::to_string)
}

fn first_integer(doc: &KdlDocument, name: &str) -> Option<i128> {
    doc.get(name)?.entries().first()?.value().as_integer()
}

fn push_node(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
        assert_eq!(format!("{}", OutputFormat::Human), "human");
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let config = BearingConfig::from_kdl(&KdlDocument::new());
        assert_eq!(config, BearingConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            git-author-name "Ada"
            git-author-email "ada@example.com"
            doing-wip-limit 3
            log-level "debug"
            output-format "human"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = BearingConfig::from_kdl(&doc);

        assert_eq!(config.git_author_name.as_deref(), Some("Ada"));
        assert_eq!(config.git_author_email.as_deref(), Some("ada@example.com"));
        assert_eq!(config.doing_wip_limit, Some(3));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
    }

    #[test]
    fn test_config_from_kdl_ignores_bad_values() {
        let kdl = r#"
            doing-wip-limit -2
            output-format "xml"
            git-author-name 42
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = BearingConfig::from_kdl(&doc);
        assert_eq!(config, BearingConfig::default());
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = BearingConfig {
            git_author_name: Some("Ada".to_string()),
            git_author_email: None,
            doing_wip_limit: Some(2),
            log_level: Some("info".to_string()),
            output_format: Some(OutputFormat::Json),
        };
        let text = config.to_kdl().to_string();
        let doc: KdlDocument = text.parse().unwrap();
        assert_eq!(BearingConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_config_validate() {
        assert!(BearingConfig::default().validate().is_ok());

        let zero = BearingConfig {
            doing_wip_limit: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().contains("doing-wip-limit"));

        let level = BearingConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(level.validate().unwrap_err().contains("log-level"));

        let blank = BearingConfig {
            git_author_email: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base = BearingConfig {
            git_author_name: Some("System".to_string()),
            doing_wip_limit: Some(5),
            ..Default::default()
        };
        let overlay = BearingConfig {
            git_author_name: Some("Data".to_string()),
            ..Default::default()
        };
        base.merge(&overlay);
        assert_eq!(base.git_author_name.as_deref(), Some("Data"));
        assert_eq!(base.doing_wip_limit, Some(5));
    }
}
