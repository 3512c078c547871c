//! Common test utilities for masthead integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/masthead/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace_dir`: Acts as the workspace root
/// - `data_dir`: Holds masthead's data (via `MH_DATA_DIR` env var)
///
/// The `mh()` method returns a `Command` that automatically sets `MH_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the mh binary with isolated data directory.
    ///
    /// Sets `MH_DATA_DIR` per-command for parallel safety.
    pub fn mh(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mh"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("MH_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &std::path::Path {
        self.workspace_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Write a report file under `reports/` in the workspace.
    pub fn write_report(&self, name: &str, contents: &str) {
        let dir = self.path().join("reports");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), contents).unwrap();
    }

    /// Write `masthead.toml` at the workspace root.
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.path().join("masthead.toml"), contents).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
