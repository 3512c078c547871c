//! CLI argument definitions for Masthead.

use clap::{Parser, Subcommand};

/// Masthead - a workspace report lookout.
///
/// Start with `mh load` to ingest the workspace's report snapshot, then
/// explore with `mh graph`, `mh health`, and `mh drift`. Guard checks
/// are re-run with `mh guard run`.
#[derive(Parser, Debug)]
#[command(name = "mh")]
#[command(author, version, about = "Aggregate workspace automation reports and guard runs", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of compact JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if mh was started in <path> instead of the current directory.
    /// Can also be set via the MH_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "MH_WORKSPACE")]
    pub workspace: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load all reports from the snapshot (and remote mirror with --remote)
    Load {
        /// Try the configured remote mirror before the local snapshot
        #[arg(long)]
        remote: bool,
    },

    /// Graph exploration commands
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Show the capability-health report
    Health,

    /// Show the token-drift report
    Drift,

    /// Show historical agent run entries
    Runs {
        /// Maximum number of entries to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Guard check commands
    Guard {
        #[command(subcommand)]
        command: GuardCommands,
    },

    /// System commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// Graph subcommands
#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// List distinct node kinds (drives category filters and layers)
    Kinds,

    /// List nodes matching a kind and search text
    Filter {
        /// Node kind, or "all" to bypass the kind filter
        #[arg(long, default_value = "all")]
        kind: String,

        /// Case-insensitive substring matched against title, id, and tags
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List edges touching a node
    Edges {
        /// Node id
        id: String,
    },

    /// Compute node positions for a canvas
    Layout {
        /// Canvas width
        #[arg(long, default_value_t = 800.0)]
        width: f64,

        /// Canvas height
        #[arg(long, default_value_t = 600.0)]
        height: f64,

        /// Restrict layout to one node kind ("all" for everything)
        #[arg(long, default_value = "all")]
        kind: String,
    },
}

/// Guard subcommands
#[derive(Subcommand, Debug)]
pub enum GuardCommands {
    /// Run a configured guard check and record the outcome
    Run {
        /// Guard name (e.g. toolchain-pin, token-drift, search-index)
        name: String,
    },

    /// List configured guard checks
    List,

    /// Show guard run history, most recent first
    History {
        /// Maximum number of records to show
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Show version and build information
    Version,
}
