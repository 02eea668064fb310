//! Bearing - personal planning core.
//!
//! This library links long-term goals (themes, objectives, key results), a
//! yearly calendar, and a Kanban task board. It provides the domain
//! consistency layer consumed by the `bearing` CLI and any other front end:
//! ID allocation, OKR lifecycle validation, the task rule engine, and
//! git-backed persistence.

pub mod cli;
pub mod commands;
pub mod config;
pub mod ids;
pub mod logging;
pub mod models;
pub mod planning;
pub mod rules;
pub mod storage;

pub use planning::PlanningManager;

use models::okr::CompletionBlocker;
use rules::RuleViolation;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::planning::PlanningManager;
    use crate::storage::Storage;

    /// Test environment with an isolated data directory.
    pub struct TestEnv {
        pub data_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                data_dir: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Initialize storage (including the git repository) in the data dir.
        pub fn init_storage(&self) -> Storage {
            Storage::init(self.path()).unwrap()
        }

        /// Initialize storage and wrap it in a manager with default rules.
        pub fn init_manager(&self) -> PlanningManager {
            PlanningManager::new(self.init_storage())
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Broad error class, used by front ends to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed argument, rejected before any I/O.
    Validation,
    /// An ID did not resolve in the searched scope.
    NotFound,
    /// A well-formed request refused by lifecycle or board rules.
    RuleViolation,
    /// Disk or version-control failure.
    Persistence,
}

/// Library-level error type for Bearing operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Not initialized: run `bearing init` first")]
    NotInitialized,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("Cannot complete {id}: {}", format_blockers(.blockers))]
    CompletionBlocked {
        id: String,
        blockers: Vec<CompletionBlocker>,
    },

    #[error("Rule violation: {}", format_violations(.0))]
    RuleViolation(Vec<RuleViolation>),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Classify this error into the four-way taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidId(_) | Error::InvalidInput(_) => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidTransition { .. }
            | Error::CompletionBlocked { .. }
            | Error::RuleViolation(_) => ErrorKind::RuleViolation,
            Error::Io(_)
            | Error::Json(_)
            | Error::Git(_)
            | Error::NotInitialized
            | Error::Config(_) => ErrorKind::Persistence,
        }
    }
}

fn format_blockers(blockers: &[CompletionBlocker]) -> String {
    let items: Vec<String> = blockers
        .iter()
        .map(|b| format!("{} \"{}\" is {}", b.id, b.label, b.status))
        .collect();
    format!("{} child item(s) still open: {}", blockers.len(), items.join("; "))
}

fn format_violations(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("[{}] {}", v.rule_id, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for Bearing operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::okr::OkrStatus;

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            Error::InvalidInput("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::not_found("Task", "H-T1").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::RuleViolation(Vec::new()).kind(),
            ErrorKind::RuleViolation
        );
        assert_eq!(Error::Git("boom".to_string()).kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_completion_blocked_lists_every_child() {
        let err = Error::CompletionBlocked {
            id: "H-O1".to_string(),
            blockers: vec![
                CompletionBlocker {
                    id: "H-KR1".to_string(),
                    label: "Run 10k".to_string(),
                    status: OkrStatus::Active,
                },
                CompletionBlocker {
                    id: "H-O2".to_string(),
                    label: "Build base".to_string(),
                    status: OkrStatus::Active,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("H-KR1 \"Run 10k\" is active"));
        assert!(message.contains("H-O2 \"Build base\" is active"));
        assert!(message.contains("2 child item(s)"));
    }

    #[test]
    fn test_not_found_mentions_id() {
        let err = Error::not_found("Objective", "H-O9");
        assert_eq!(err.to_string(), "Objective not found: H-O9");
    }
}
