//! Query views over a loaded workspace graph.
//!
//! All operations here are read-only: they return views (references in
//! original order) and never mutate the underlying snapshot. Unknown
//! node ids and dangling edges yield empty results, not errors.

use std::collections::BTreeSet;

use crate::models::{GraphEdge, GraphNode, WorkspaceGraph};

/// Kind filter value that bypasses kind filtering.
pub const KIND_ALL: &str = "all";

impl WorkspaceGraph {
    /// Distinct node kinds, lexicographically sorted.
    ///
    /// Drives category filters and the layout's layer order.
    pub fn distinct_kinds(&self) -> Vec<String> {
        let kinds: BTreeSet<&str> = self.nodes.iter().map(|n| n.kind.as_str()).collect();
        kinds.into_iter().map(String::from).collect()
    }

    /// Nodes matching a kind and search text, in original order.
    ///
    /// `kind == "all"` bypasses the kind filter; an empty search bypasses
    /// the text filter. Text matches case-insensitively against title,
    /// id, and tags.
    pub fn filter(&self, kind: &str, search: &str) -> Vec<&GraphNode> {
        let needle = search.trim().to_lowercase();
        self.nodes
            .iter()
            .filter(|n| kind == KIND_ALL || n.kind.as_str() == kind)
            .filter(|n| needle.is_empty() || matches_text(n, &needle))
            .collect()
    }

    /// All edges with either endpoint equal to `node_id`, original order.
    pub fn edges_touching(&self, node_id: &str) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.from == node_id || e.to == node_id)
            .collect()
    }

    /// Edges whose both endpoints are in `ids`, original order.
    ///
    /// Used when a kind filter narrows the node set: edges to
    /// filtered-out or missing nodes are silently excluded.
    pub fn edges_among(&self, ids: &BTreeSet<&str>) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
            .collect()
    }
}

/// Case-insensitive substring match against title, id, and tags.
fn matches_text(node: &GraphNode, needle: &str) -> bool {
    if node.id.to_lowercase().contains(needle) {
        return true;
    }
    if let Some(title) = &node.title {
        if title.to_lowercase().contains(needle) {
            return true;
        }
    }
    node.tags.iter().any(|t| t.to_lowercase().contains(needle))
}
