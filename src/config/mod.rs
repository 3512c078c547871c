//! Configuration for Masthead.
//!
//! Settings live in `masthead.toml` at the workspace root. Everything
//! is optional; a missing file means defaults, and a malformed file is
//! the one configuration error surfaced to the user.
//!
//! ```toml
//! [reports]
//! snapshot_dir = "reports"
//! remote_base = "https://mirror.example.com/reports"
//! fetch_timeout_secs = 10
//!
//! [guard]
//! timeout_secs = 120
//! history_cap = 200
//!
//! [[guard.commands]]
//! name = "toolchain-pin"
//! label = "Toolchain pin check"
//! program = "scripts/check-toolchain-pin.sh"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::guard::GuardCommand;
use crate::history::DEFAULT_HISTORY_CAP;
use crate::Result;

/// File name looked up at the workspace root.
pub const CONFIG_FILE: &str = "masthead.toml";

/// Default subdirectory holding the bundled report snapshot.
pub const DEFAULT_SNAPSHOT_DIR: &str = "reports";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GUARD_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    reports: RawReports,
    #[serde(default)]
    guard: RawGuard,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReports {
    snapshot_dir: Option<String>,
    remote_base: Option<String>,
    fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuard {
    timeout_secs: Option<u64>,
    history_cap: Option<usize>,
    #[serde(default)]
    commands: Vec<GuardCommand>,
}

/// Resolved configuration with defaults applied.
#[derive(Debug, Clone)]
pub struct MastheadConfig {
    /// Snapshot directory, relative paths resolved against the workspace
    pub snapshot_dir: PathBuf,
    /// Remote mirror base URL, when configured
    pub remote_base: Option<String>,
    /// Timeout for remote fetches
    pub fetch_timeout: Duration,
    /// Timeout for guard command execution
    pub guard_timeout: Duration,
    /// Guard history retention cap
    pub history_cap: usize,
    /// Configured guard commands
    pub guards: Vec<GuardCommand>,
}

impl MastheadConfig {
    /// Load configuration for a workspace, applying defaults for
    /// anything unset. A missing config file is not an error.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        let raw = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            toml::from_str::<RawConfig>(&text)?
        } else {
            RawConfig::default()
        };
        Ok(Self::from_raw(raw, workspace))
    }

    fn from_raw(raw: RawConfig, workspace: &Path) -> Self {
        let snapshot_dir = raw
            .reports
            .snapshot_dir
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_DIR.to_string());
        let snapshot_dir = if Path::new(&snapshot_dir).is_absolute() {
            PathBuf::from(snapshot_dir)
        } else {
            workspace.join(snapshot_dir)
        };

        let guards = if raw.guard.commands.is_empty() {
            default_guards()
        } else {
            raw.guard.commands
        };

        Self {
            snapshot_dir,
            remote_base: raw.reports.remote_base,
            fetch_timeout: Duration::from_secs(
                raw.reports
                    .fetch_timeout_secs
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            guard_timeout: Duration::from_secs(
                raw.guard.timeout_secs.unwrap_or(DEFAULT_GUARD_TIMEOUT_SECS),
            ),
            history_cap: raw.guard.history_cap.unwrap_or(DEFAULT_HISTORY_CAP),
            guards,
        }
    }

    /// Find a configured guard by name.
    pub fn guard(&self, name: &str) -> Option<&GuardCommand> {
        self.guards.iter().find(|g| g.name == name)
    }
}

/// The guard set shipped when the config defines none.
fn default_guards() -> Vec<GuardCommand> {
    vec![
        GuardCommand {
            name: "toolchain-pin".to_string(),
            label: "Toolchain pin check".to_string(),
            program: "scripts/check-toolchain-pin.sh".to_string(),
            args: Vec::new(),
        },
        GuardCommand {
            name: "token-drift".to_string(),
            label: "Token drift check".to_string(),
            program: "scripts/check-token-drift.sh".to_string(),
            args: Vec::new(),
        },
        GuardCommand {
            name: "search-index".to_string(),
            label: "Search index freshness check".to_string(),
            program: "scripts/check-search-index.sh".to_string(),
            args: Vec::new(),
        },
    ]
}
