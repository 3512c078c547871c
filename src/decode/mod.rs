//! Report decoding: raw bytes into typed report values.
//!
//! Single-object reports (graph, capability-health, token-drift) get one
//! decode attempt each; a failure is a `Decode` error and the caller
//! falls back to the next source or the type default. Run history is
//! special: three wire shapes exist in the wild, tried in a fixed order,
//! and a source with no usable records is a valid empty result rather
//! than an error.

use serde::Deserialize;

use crate::models::{
    AgentRunEntry, CapabilityHealthReport, GraphEdge, GraphNode, TokenDriftReport, WorkspaceGraph,
};
use crate::{Error, Result};

/// Decode a workspace graph document and normalize it.
///
/// Normalization: nodes with empty ids are dropped, and duplicate ids
/// resolve last-write-wins (the later entry replaces the earlier one,
/// keeping the earlier position in the node order).
pub fn decode_graph(bytes: &[u8]) -> Result<WorkspaceGraph> {
    let raw: WorkspaceGraph =
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(format!("graph: {}", e)))?;
    Ok(normalize_graph(raw))
}

fn normalize_graph(raw: WorkspaceGraph) -> WorkspaceGraph {
    let mut nodes: Vec<GraphNode> = Vec::with_capacity(raw.nodes.len());
    for node in raw.nodes {
        if node.id.is_empty() {
            tracing::debug!("dropping graph node with empty id");
            continue;
        }
        match nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
    }
    // Edges pass through untouched; dangling references are a view-time
    // concern, not a load-time error.
    let edges: Vec<GraphEdge> = raw.edges;
    WorkspaceGraph { nodes, edges }
}

/// Decode a capability-health report.
pub fn decode_health(bytes: &[u8]) -> Result<CapabilityHealthReport> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(format!("capability-health: {}", e)))
}

/// Decode a token-drift report.
pub fn decode_drift(bytes: &[u8]) -> Result<TokenDriftReport> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(format!("token-drift: {}", e)))
}

/// Enveloped run history: a wrapper object holding the record array.
#[derive(Debug, Deserialize)]
struct RunEnvelope {
    #[serde(alias = "entries")]
    runs: Vec<AgentRunEntry>,
}

/// Decode run history, tolerating the three known wire shapes.
///
/// Strategies, in priority order:
/// 1. newline-delimited records (bad lines skipped, not fatal)
/// 2. a single JSON array of records
/// 3. an enveloped object wrapping the array
///
/// A source that yields no records under any strategy decodes to the
/// empty list; absent run data is a common, valid state.
pub fn decode_runs(bytes: &[u8]) -> Vec<AgentRunEntry> {
    let lines = decode_run_lines(bytes);
    if !lines.is_empty() {
        return lines;
    }

    if let Ok(array) = serde_json::from_slice::<Vec<AgentRunEntry>>(bytes) {
        if !array.is_empty() {
            return array;
        }
    }

    if let Ok(envelope) = serde_json::from_slice::<RunEnvelope>(bytes) {
        if !envelope.runs.is_empty() {
            return envelope.runs;
        }
    }

    Vec::new()
}

/// Decode newline-delimited run records, skipping undecodable lines.
fn decode_run_lines(bytes: &[u8]) -> Vec<AgentRunEntry> {
    let text = String::from_utf8_lossy(bytes);
    let mut entries = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<AgentRunEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::debug!("skipping undecodable run line: {}", e),
        }
    }
    entries
}
