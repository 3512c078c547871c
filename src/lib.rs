//! Masthead - a workspace report lookout for automation tooling.
//!
//! This library provides the core functionality for the `mh` CLI tool:
//! loading heterogeneous operational reports (capability graph,
//! capability-health, token-drift, agent run history), normalizing them
//! into one in-memory model, laying the graph out for display, and
//! running guard checks with a persisted bounded history.

pub mod cli;
pub mod commands;
pub mod config;
pub mod decode;
pub mod graph;
pub mod guard;
pub mod history;
pub mod layout;
pub mod models;
pub mod sources;
pub mod state;
pub mod storage;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::storage::FileStore;

    /// Test environment with an isolated workspace and data directory.
    ///
    /// Storage-layer and command-layer unit tests construct stores through
    /// dependency injection so they never touch `~/.local/share/masthead/`.
    pub struct TestEnv {
        /// Simulated workspace directory
        pub workspace_dir: TempDir,
        /// Isolated data storage directory
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

        /// Get the path to the simulated workspace.
        pub fn path(&self) -> &Path {
            self.workspace_dir.path()
        }

        /// Open a file store rooted in the isolated data directory.
        pub fn store(&self) -> FileStore {
            FileStore::open_with_data_dir(self.path(), self.data_dir.path()).unwrap()
        }

        /// Write a snapshot report file under `reports/` in the workspace.
        pub fn write_report(&self, name: &str, contents: &str) {
            let dir = self.path().join("reports");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(name), contents).unwrap();
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for Masthead operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Malformed report: {0}")]
    Decode(String),

    #[error("Source unreachable: {0}")]
    Unreachable(String),

    #[error("Unknown guard: {0}")]
    UnknownGuard(String),

    #[error("A guard is already running")]
    GuardBusy,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Masthead operations.
pub type Result<T> = std::result::Result<T, Error>;
