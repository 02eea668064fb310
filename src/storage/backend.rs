//! Versioned store trait and the transaction built on top of it.
//!
//! A mutation goes through `begin -> stage(paths) -> commit(message)`:
//! the caller has already written its files; the transaction records exactly
//! the paths it was given and turns them into one commit. If staging or the
//! commit fails, the staged paths are reset before the error is returned so
//! the next operation starts from a clean index.

use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One entry of version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub id: String,
    pub message: String,
    /// ISO 8601 author timestamp
    pub timestamp: String,
}

/// Result of committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "commit", rename_all = "lowercase")]
pub enum CommitOutcome {
    /// A new commit was created.
    Committed(String),
    /// Nothing differed from the last commit; no commit was created.
    Unchanged,
}

impl CommitOutcome {
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            CommitOutcome::Committed(id) => Some(id),
            CommitOutcome::Unchanged => None,
        }
    }
}

/// Trait for version-control backends holding the data directory history.
pub trait VersionedStore: Send + Sync {
    /// Create the repository if it does not exist yet.
    fn init(&self) -> Result<()>;

    /// Check whether the repository exists.
    fn is_initialized(&self) -> bool;

    /// Stage the given paths (relative to the data directory). A path that no
    /// longer exists on disk stages its removal.
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Drop the given paths from the index, restoring the last committed state.
    fn unstage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Whether anything is staged relative to the last commit.
    fn has_staged_changes(&self) -> Result<bool>;

    /// Commit the index and return the new commit ID.
    fn commit(&self, message: &str) -> Result<String>;

    /// Newest `limit` commits, newest first.
    fn history(&self, limit: usize) -> Result<Vec<CommitInfo>>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;
}

/// An open transaction over a versioned store.
pub struct Transaction<'a> {
    store: &'a dyn VersionedStore,
    staged: Vec<PathBuf>,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction.
    pub fn begin(store: &'a dyn VersionedStore) -> Self {
        Self {
            store,
            staged: Vec::new(),
        }
    }

    /// Stage paths. Duplicates are ignored.
    pub fn stage<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        let fresh: Vec<PathBuf> = paths
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .filter(|p| !self.staged.contains(p))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }

        self.staged.extend(fresh.iter().cloned());
        if let Err(e) = self.store.stage(&fresh) {
            self.rollback();
            return Err(e);
        }
        Ok(())
    }

    /// Paths staged so far.
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    /// Commit everything staged. Returns `Unchanged` when the staged content is
    /// identical to the last commit.
    pub fn commit(self, message: &str) -> Result<CommitOutcome> {
        let has_changes = match self.store.has_staged_changes() {
            Ok(has_changes) => has_changes,
            Err(e) => {
                self.rollback();
                return Err(e);
            }
        };
        if !has_changes {
            tracing::debug!("nothing to commit for \"{}\"", message);
            return Ok(CommitOutcome::Unchanged);
        }

        match self.store.commit(message) {
            Ok(id) => {
                tracing::info!("committed {} \"{}\"", short_id(&id), message);
                Ok(CommitOutcome::Committed(id))
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn rollback(&self) {
        if self.staged.is_empty() {
            return;
        }
        if let Err(e) = self.store.unstage(&self.staged) {
            tracing::warn!("failed to reset staged paths after error: {}", e);
        }
    }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}
