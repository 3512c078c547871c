//! Data models for Masthead reports and records.
//!
//! This module defines the core data structures:
//! - `WorkspaceGraph` - Normalized capability/dependency graph snapshot
//! - `CapabilityHealthReport` - Per-capability health scan results
//! - `TokenDriftReport` - Design-token drift check results
//! - `AgentRunEntry` - Historical agent/guard run records (ingested)
//! - `GuardRunRecord` - Guard runs triggered by masthead itself
//!
//! Upstream producers use camelCase keys; serde aliases map them onto
//! the snake_case fields so both conventions decode transparently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag for a graph node.
///
/// Report producers introduce new kinds without coordinating with us,
/// so this stays open: anything unrecognized lands in `Other` and keeps
/// its raw spelling for display and layout grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Capability,
    Template,
    Schema,
    Doc,
    Other(String),
}

impl NodeKind {
    /// The raw string form, as produced and consumed on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Capability => "capability",
            Self::Template => "template",
            Self::Schema => "schema",
            Self::Doc => "doc",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "capability" => Self::Capability,
            "template" => Self::Template,
            "schema" => Self::Schema,
            "doc" => Self::Doc,
            _ => Self::Other(s),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the workspace graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier, stable across loads
    pub id: String,

    /// Category tag (capability, template, schema, doc, ...)
    #[serde(default = "default_kind")]
    pub kind: NodeKind,

    /// Optional display label; display falls back to `id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Free-text labels for filtering
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_kind() -> NodeKind {
    NodeKind::Other("other".to_string())
}

impl GraphNode {
    /// The label shown for this node: the title when present, else the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// A directed edge in the workspace graph.
///
/// Referential integrity is not enforced at load time; edges pointing at
/// missing nodes are tolerated and skipped at view/layout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id
    pub from: String,

    /// Target node id
    pub to: String,

    /// Relationship label (e.g. "depends", "documents")
    #[serde(rename = "type", default)]
    pub edge_type: String,
}

/// An immutable snapshot of the workspace graph.
///
/// Replaced wholesale on each successful load; never patched in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceGraph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// Health status sentinel: anything other than this means degraded.
pub const STATUS_OK: &str = "ok";

/// One capability's entry in a health scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityHealthEntry {
    /// Capability id
    pub id: String,

    /// Free-text status; `"ok"` is the healthy sentinel
    #[serde(default)]
    pub status: String,

    /// Optional one-line summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Issue descriptions, present when degraded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl CapabilityHealthEntry {
    /// Whether this entry reports a healthy capability.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// A capability-health scan report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityHealthReport {
    /// Timestamp string from the producer, passed through opaquely
    #[serde(
        default,
        alias = "generatedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_at: Option<String>,

    #[serde(default)]
    pub entries: Vec<CapabilityHealthEntry>,
}

impl CapabilityHealthReport {
    /// True when any entry is not `"ok"`.
    pub fn has_issues(&self) -> bool {
        self.entries.iter().any(|e| !e.is_ok())
    }
}

/// A token-drift check report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenDriftReport {
    #[serde(
        default,
        alias = "generatedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_at: Option<String>,

    /// Tri-state: true = drift detected, false = clean, absent = unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<bool>,

    /// Whether the producer's own validation passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<bool>,

    /// Free text explaining a failed validation
    #[serde(
        default,
        alias = "validationReason",
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_reason: Option<String>,
}

/// A historical agent run, ingested from upstream run records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunEntry {
    /// Run id
    pub id: String,

    /// Capability the run exercised, when known
    #[serde(
        default,
        alias = "capabilityId",
        skip_serializing_if = "Option::is_none"
    )]
    pub capability_id: Option<String>,

    /// Free-text status; `"ok"` is the healthy sentinel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, alias = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    #[serde(
        default,
        alias = "completedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Outcome classification for a guard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardStatus {
    /// Exit code 0
    Ok,
    /// Nonzero exit, spawn failure, or timeout
    Issue,
}

impl fmt::Display for GuardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Issue => write!(f, "issue"),
        }
    }
}

/// A record of one guard run triggered through masthead.
///
/// Created once the guard command completes, prepended to the history
/// list, and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardRunRecord {
    /// Unique record id
    pub id: String,

    /// Human description of the guard invoked
    pub label: String,

    /// Classified outcome
    pub status: GuardStatus,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl GuardRunRecord {
    /// Create a record with a fresh unique id and the current time.
    pub fn new(label: impl Into<String>, status: GuardStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.into(),
            status,
            timestamp: Utc::now(),
        }
    }
}
