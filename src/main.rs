//! Masthead CLI - a workspace report lookout for automation tooling.

use clap::Parser;
use masthead::cli::{Cli, Commands, GraphCommands, GuardCommands, SystemCommands};
use masthead::commands;
use masthead::state::AppState;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Log level comes from MH_LOG; silent by default so JSON output
    // stays machine-parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MH_LOG").unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine workspace path: --workspace flag > MH_WORKSPACE env > cwd
    let workspace = resolve_workspace_path(cli.workspace, human);

    if let Err(e) = run_command(cli.command, &workspace, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace path from the explicit flag or environment
/// variable, falling back to the current directory.
fn resolve_workspace_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!(
                        "Error: Specified workspace path does not exist: {}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!(
                                "Specified workspace path does not exist: {}",
                                path.display()
                            )
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(command: Commands, workspace: &Path, human: bool) -> Result<(), masthead::Error> {
    match command {
        Commands::Load { remote } => {
            let result = commands::load(workspace, remote)?;
            output(&result, human);
        }

        Commands::Graph { command } => match command {
            GraphCommands::Kinds => {
                let result = commands::graph_kinds(workspace)?;
                output(&result, human);
            }
            GraphCommands::Filter { kind, search } => {
                let result = commands::graph_filter(workspace, &kind, &search)?;
                output(&result, human);
            }
            GraphCommands::Edges { id } => {
                let result = commands::graph_edges(workspace, &id)?;
                output(&result, human);
            }
            GraphCommands::Layout {
                width,
                height,
                kind,
            } => {
                let result = commands::graph_layout(workspace, width, height, &kind)?;
                output(&result, human);
            }
        },

        Commands::Health => {
            let result = commands::health(workspace)?;
            output(&result, human);
        }

        Commands::Drift => {
            let result = commands::drift(workspace)?;
            output(&result, human);
        }

        Commands::Runs { limit } => {
            let result = commands::runs(workspace, limit)?;
            output(&result, human);
        }

        Commands::Guard { command } => match command {
            GuardCommands::Run { name } => {
                let state = AppState::new();
                let result = commands::guard_run(workspace, &name, &state)?;
                output(&result, human);
            }
            GuardCommands::List => {
                let result = commands::guard_list(workspace)?;
                output(&result, human);
            }
            GuardCommands::History { limit } => {
                let result = commands::guard_history(workspace, limit)?;
                output(&result, human);
            }
        },

        Commands::System { command } => match command {
            SystemCommands::Version => {
                let result = commands::version();
                output(&result, human);
            }
        },
    }

    Ok(())
}

/// Print a result as compact JSON, or pretty-printed with -H.
fn output<T: Serialize>(result: &T, human: bool) {
    let rendered = if human {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            process::exit(1);
        }
    }
}
