//! Command implementations for the Masthead CLI.
//!
//! Each command loads what it needs, queries the shared state, and
//! returns a serializable result struct; `main` handles rendering.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use crate::config::MastheadConfig;
use crate::graph::KIND_ALL;
use crate::guard::{self, GuardCommand};
use crate::history::GuardHistory;
use crate::layout::{self, Position};
use crate::models::{
    AgentRunEntry, CapabilityHealthReport, GraphEdge, GraphNode, GuardRunRecord, TokenDriftReport,
};
use crate::sources::{Fetcher, HttpFetcher, RemoteStatus, Source, SourceResolver};
use crate::state::AppState;
use crate::storage::FileStore;
use crate::{Error, Result};

/// Populate the state container from the workspace's report sources.
fn load_state(workspace: &Path, remote: bool, state: &AppState) -> Result<RemoteStatus> {
    let config = MastheadConfig::load(workspace)?;

    let mut sources = Vec::new();
    let mut fetcher: Option<HttpFetcher> = None;
    if remote {
        match &config.remote_base {
            Some(base) => {
                state.set_remote_status(RemoteStatus::Fetching);
                sources.push(Source::Remote(base.clone()));
                fetcher = Some(HttpFetcher::new(config.fetch_timeout));
            }
            None => {
                return Err(Error::InvalidInput(
                    "no remote_base configured in masthead.toml".to_string(),
                ));
            }
        }
    }
    sources.push(Source::Snapshot(config.snapshot_dir.clone()));

    let resolver = SourceResolver::new(sources, fetcher.as_ref().map(|f| f as &dyn Fetcher));
    let reports = resolver.load_reports();
    if let Some(outcome) = resolver.remote_outcome() {
        state.set_remote_status(outcome);
    }
    state.replace_reports(reports);
    Ok(state.remote_status())
}

/// Load reports from the local snapshot only, for read-side commands.
fn load_local(workspace: &Path, state: &AppState) -> Result<()> {
    load_state(workspace, false, state)?;
    Ok(())
}

/// Result of `mh load`.
#[derive(Debug, Serialize)]
pub struct LoadResult {
    pub nodes: usize,
    pub edges: usize,
    pub health_entries: usize,
    pub any_issue: bool,
    pub drift: Option<bool>,
    pub runs: usize,
    pub remote_status: RemoteStatus,
}

pub fn load(workspace: &Path, remote: bool) -> Result<LoadResult> {
    let state = AppState::new();
    let remote_status = load_state(workspace, remote, &state)?;

    let graph = state.graph();
    let health = state.health();
    Ok(LoadResult {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        health_entries: health.entries.len(),
        any_issue: health.has_issues(),
        drift: state.drift().drift,
        runs: state.runs().len(),
        remote_status,
    })
}

/// Result of `mh graph kinds`.
#[derive(Debug, Serialize)]
pub struct KindsResult {
    pub kinds: Vec<String>,
}

pub fn graph_kinds(workspace: &Path) -> Result<KindsResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    Ok(KindsResult {
        kinds: state.graph().distinct_kinds(),
    })
}

/// Result of `mh graph filter`.
#[derive(Debug, Serialize)]
pub struct FilterResult {
    pub nodes: Vec<GraphNode>,
    /// Edges whose both endpoints survived the filter
    pub edges: Vec<GraphEdge>,
}

pub fn graph_filter(workspace: &Path, kind: &str, search: &str) -> Result<FilterResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    let graph = state.graph();

    let nodes: Vec<GraphNode> = graph.filter(kind, search).into_iter().cloned().collect();
    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: Vec<GraphEdge> = graph.edges_among(&ids).into_iter().cloned().collect();
    Ok(FilterResult { nodes, edges })
}

/// Result of `mh graph edges`.
#[derive(Debug, Serialize)]
pub struct EdgesResult {
    pub id: String,
    pub edges: Vec<GraphEdge>,
}

pub fn graph_edges(workspace: &Path, id: &str) -> Result<EdgesResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    let edges: Vec<GraphEdge> = state
        .graph()
        .edges_touching(id)
        .into_iter()
        .cloned()
        .collect();
    Ok(EdgesResult {
        id: id.to_string(),
        edges,
    })
}

/// Result of `mh graph layout`.
#[derive(Debug, Serialize)]
pub struct LayoutResult {
    pub width: f64,
    pub height: f64,
    pub positions: BTreeMap<String, Position>,
    /// Edges whose both endpoints have a position
    pub edges: Vec<GraphEdge>,
}

pub fn graph_layout(workspace: &Path, width: f64, height: f64, kind: &str) -> Result<LayoutResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    let graph = state.graph();

    let nodes: Vec<GraphNode> = if kind == KIND_ALL {
        graph.nodes.clone()
    } else {
        graph.filter(kind, "").into_iter().cloned().collect()
    };
    let positions = layout::layout(&nodes, width, height);
    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: Vec<GraphEdge> = graph.edges_among(&ids).into_iter().cloned().collect();

    Ok(LayoutResult {
        width,
        height,
        positions,
        edges,
    })
}

/// Result of `mh health`.
#[derive(Debug, Serialize)]
pub struct HealthResult {
    pub any_issue: bool,
    #[serde(flatten)]
    pub report: CapabilityHealthReport,
}

pub fn health(workspace: &Path) -> Result<HealthResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    let report = state.health();
    Ok(HealthResult {
        any_issue: report.has_issues(),
        report: CapabilityHealthReport::clone(&report),
    })
}

pub fn drift(workspace: &Path) -> Result<TokenDriftReport> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    Ok(TokenDriftReport::clone(&state.drift()))
}

/// Result of `mh runs`.
#[derive(Debug, Serialize)]
pub struct RunsResult {
    pub total: usize,
    pub runs: Vec<AgentRunEntry>,
}

pub fn runs(workspace: &Path, limit: Option<usize>) -> Result<RunsResult> {
    let state = AppState::new();
    load_local(workspace, &state)?;
    let all: Arc<Vec<AgentRunEntry>> = state.runs();
    let total = all.len();
    let runs = match limit {
        Some(n) => all.iter().take(n).cloned().collect(),
        None => Vec::clone(&all),
    };
    Ok(RunsResult { total, runs })
}

/// Result of `mh guard run`.
#[derive(Debug, Serialize)]
pub struct GuardRunResult {
    pub record: GuardRunRecord,
    pub exit_code: Option<i32>,
    pub output: String,
    pub history_len: usize,
}

pub fn guard_run(workspace: &Path, name: &str, state: &AppState) -> Result<GuardRunResult> {
    let config = MastheadConfig::load(workspace)?;
    let command = config
        .guard(name)
        .cloned()
        .ok_or_else(|| Error::UnknownGuard(name.to_string()))?;

    if !state.begin_guard() {
        return Err(Error::GuardBusy);
    }

    let outcome = guard::run_guard(&command, config.guard_timeout);

    // Persist before releasing the single-flight slot; the slot is
    // released on every path.
    let persisted = (|| -> Result<usize> {
        let mut store = FileStore::open(workspace)?;
        let mut history = GuardHistory::load(&store, config.history_cap);
        history.push(outcome.record.clone(), &mut store)?;
        Ok(history.len())
    })();
    state.finish_guard(outcome.output.clone(), outcome.exit_code);
    let history_len = persisted?;

    Ok(GuardRunResult {
        record: outcome.record,
        exit_code: outcome.exit_code,
        output: outcome.output,
        history_len,
    })
}

/// Result of `mh guard list`.
#[derive(Debug, Serialize)]
pub struct GuardListResult {
    pub guards: Vec<GuardCommand>,
}

pub fn guard_list(workspace: &Path) -> Result<GuardListResult> {
    let config = MastheadConfig::load(workspace)?;
    Ok(GuardListResult {
        guards: config.guards,
    })
}

/// Result of `mh guard history`.
#[derive(Debug, Serialize)]
pub struct GuardHistoryResult {
    pub total: usize,
    pub records: Vec<GuardRunRecord>,
}

pub fn guard_history(workspace: &Path, limit: Option<usize>) -> Result<GuardHistoryResult> {
    let config = MastheadConfig::load(workspace)?;
    let store = FileStore::open(workspace)?;
    let history = GuardHistory::load(&store, config.history_cap);
    let total = history.len();
    let records = match limit {
        Some(n) => history.records().iter().take(n).cloned().collect(),
        None => history.records().to_vec(),
    };
    Ok(GuardHistoryResult { total, records })
}

/// Result of `mh system version`.
#[derive(Debug, Serialize)]
pub struct VersionResult {
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
}

pub fn version() -> VersionResult {
    VersionResult {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("MH_GIT_COMMIT"),
        built_at: env!("MH_BUILD_TIMESTAMP"),
    }
}
