//! Git versioned-store backend.
//!
//! The data directory is itself the work tree of a git repository. Records are
//! written in place by the record store; this backend only stages the paths a
//! mutation touched and commits them.
//!
//! ## How It Works
//!
//! 1. `stage` runs `git add` for paths that exist and `git rm --cached` for
//!    paths that were removed, so a rename is a removal plus an addition in
//!    the same commit
//! 2. `commit` runs `git commit` with an explicit identity and signing off
//! 3. `unstage` runs `git reset` on the given paths after a failure

use super::backend::{CommitInfo, VersionedStore};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Field separator used in `git log` output.
const FIELD_SEP: char = '\x1f';

/// Author identity used for every commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            name: "Bearing".to_string(),
            email: "bearing@localhost".to_string(),
        }
    }
}

/// Versioned store backed by a git repository at the data directory root.
pub struct GitBackend {
    /// Work tree root (the data directory).
    root: PathBuf,
    identity: GitIdentity,
}

impl GitBackend {
    pub fn new(root: &Path, identity: GitIdentity) -> Self {
        Self {
            root: root.to_path_buf(),
            identity,
        }
    }

    /// Run git in the data directory and return its raw output.
    fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| Error::Git(format!("Failed to run git: {}", e)))
    }

    /// Run git and require success, returning trimmed stdout.
    fn git_cmd(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git with a trailing `--` pathspec list.
    fn git_paths(&self, args: &[&str], paths: &[PathBuf]) -> Result<String> {
        let rendered: Vec<String> = paths.iter().map(|p| pathspec(p)).collect();
        let mut full: Vec<&str> = args.to_vec();
        full.push("--");
        full.extend(rendered.iter().map(String::as_str));
        self.git_cmd(&full)
    }

    fn has_head(&self) -> bool {
        self.run(&["rev-parse", "--verify", "-q", "HEAD"])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl VersionedStore for GitBackend {
    fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.git_cmd(&["init", "-q"])?;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        // Only a repository rooted exactly here counts; an enclosing
        // repository must never receive planning commits.
        self.root.join(".git").exists()
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) = paths
            .iter()
            .cloned()
            .partition(|p| self.root.join(p).exists());

        if !present.is_empty() {
            self.git_paths(&["add", "--all"], &present)?;
        }
        if !missing.is_empty() {
            self.git_paths(
                &["rm", "--cached", "-r", "-q", "--ignore-unmatch"],
                &missing,
            )?;
        }
        Ok(())
    }

    fn unstage(&self, paths: &[PathBuf]) -> Result<()> {
        if self.has_head() {
            self.git_paths(&["reset", "-q"], paths)?;
        } else {
            self.git_paths(&["rm", "--cached", "-r", "-q", "--ignore-unmatch"], paths)?;
        }
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        if !self.has_head() {
            return Ok(!self.git_cmd(&["ls-files"])?.is_empty());
        }

        let output = self.run(&["diff", "--cached", "--quiet"])?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::Git(format!(
                "git diff failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }

    fn commit(&self, message: &str) -> Result<String> {
        let name = format!("user.name={}", self.identity.name);
        let email = format!("user.email={}", self.identity.email);
        self.git_cmd(&[
            "-c",
            &name,
            "-c",
            &email,
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "--no-verify",
            "-m",
            message,
        ])?;
        self.git_cmd(&["rev-parse", "HEAD"])
    }

    fn history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        if limit == 0 || !self.has_head() {
            return Ok(Vec::new());
        }

        let count = limit.to_string();
        let format = format!("--format=%H{sep}%s{sep}%aI", sep = "%x1f");
        let log = self.git_cmd(&["log", "-n", &count, &format])?;
        Ok(log.lines().filter_map(parse_log_line).collect())
    }

    fn location(&self) -> String {
        format!("git repository at {}", self.root.display())
    }
}

/// Pathspecs always use forward slashes.
fn pathspec(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn parse_log_line(line: &str) -> Option<CommitInfo> {
    let mut fields = line.splitn(3, FIELD_SEP);
    let id = fields.next()?.to_string();
    let message = fields.next()?.to_string();
    let timestamp = fields.next()?.to_string();
    Some(CommitInfo {
        id,
        message,
        timestamp,
    })
}
