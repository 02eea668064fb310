//! Common test utilities for bearing integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's real data or config directories.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
use std::process::Command as StdCommand;
pub use tempfile::TempDir;

/// A test environment with isolated data and config directories.
///
/// The `bearing()` method sets `BEARING_DATA_DIR` and `BEARING_CONFIG_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and run `bearing init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.bearing().arg("init").assert().success();
        env
    }

    /// Get a Command for the bearing binary with isolated directories.
    pub fn bearing(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bearing"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("BEARING_DATA_DIR", self.data_dir.path());
        cmd.env("BEARING_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run a command that must succeed and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.bearing().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "bearing {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Files tracked in the data directory's history.
    pub fn tracked_files(&self) -> Vec<String> {
        git_lines(self.data_path(), &["ls-files"])
    }

    /// Commit subjects, newest first.
    pub fn commit_messages(&self) -> Vec<String> {
        git_lines(self.data_path(), &["log", "--format=%s"])
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn git_lines(dir: &Path, args: &[&str]) -> Vec<String> {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}
