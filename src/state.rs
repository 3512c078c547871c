//! Process-wide published state.
//!
//! One container owns the loaded reports, the remote fetch status, the
//! guard single-flight flag, and the last guard output. Reports are
//! replaced wholesale as `Arc` snapshots, so a reader always sees
//! either the old or the new complete value and never blocks a writer
//! for long. Consumers subscribe to change notifications instead of
//! polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, RwLock};

use crate::models::{AgentRunEntry, CapabilityHealthReport, TokenDriftReport, WorkspaceGraph};
use crate::sources::{RemoteStatus, Reports};

/// Change notifications pushed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// All reports were replaced by a load
    ReportsReplaced,
    /// The remote fetch status flag moved
    RemoteStatusChanged,
    /// A guard run completed
    GuardFinished,
}

/// Output of the most recent guard run, kept for display independent of
/// the history list.
#[derive(Debug, Clone, Default)]
pub struct LastGuardOutput {
    pub output: String,
    pub exit_code: Option<i32>,
}

/// The aggregator's shared state container.
pub struct AppState {
    graph: RwLock<Arc<WorkspaceGraph>>,
    health: RwLock<Arc<CapabilityHealthReport>>,
    drift: RwLock<Arc<TokenDriftReport>>,
    runs: RwLock<Arc<Vec<AgentRunEntry>>>,
    remote_status: RwLock<RemoteStatus>,
    guard_running: AtomicBool,
    last_guard: Mutex<LastGuardOutput>,
    subscribers: Mutex<Vec<Sender<StateEvent>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(Arc::new(WorkspaceGraph::default())),
            health: RwLock::new(Arc::new(CapabilityHealthReport::default())),
            drift: RwLock::new(Arc::new(TokenDriftReport::default())),
            runs: RwLock::new(Arc::new(Vec::new())),
            remote_status: RwLock::new(RemoteStatus::default()),
            guard_running: AtomicBool::new(false),
            last_guard: Mutex::new(LastGuardOutput::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replace every report snapshot atomically (per field) and notify.
    pub fn replace_reports(&self, reports: Reports) {
        *self.graph.write().unwrap() = Arc::new(reports.graph);
        *self.health.write().unwrap() = Arc::new(reports.health);
        *self.drift.write().unwrap() = Arc::new(reports.drift);
        *self.runs.write().unwrap() = Arc::new(reports.runs);
        self.notify(StateEvent::ReportsReplaced);
    }

    pub fn graph(&self) -> Arc<WorkspaceGraph> {
        self.graph.read().unwrap().clone()
    }

    pub fn health(&self) -> Arc<CapabilityHealthReport> {
        self.health.read().unwrap().clone()
    }

    pub fn drift(&self) -> Arc<TokenDriftReport> {
        self.drift.read().unwrap().clone()
    }

    pub fn runs(&self) -> Arc<Vec<AgentRunEntry>> {
        self.runs.read().unwrap().clone()
    }

    /// Move the remote status flag. Overlapping fetch attempts resolve
    /// last-writer-wins; within one attempt the flag only moves forward.
    pub fn set_remote_status(&self, status: RemoteStatus) {
        *self.remote_status.write().unwrap() = status;
        self.notify(StateEvent::RemoteStatusChanged);
    }

    pub fn remote_status(&self) -> RemoteStatus {
        *self.remote_status.read().unwrap()
    }

    /// Claim the guard single-flight slot. Returns false while another
    /// guard run holds it.
    pub fn begin_guard(&self) -> bool {
        self.guard_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the single-flight slot and publish the run's raw output.
    pub fn finish_guard(&self, output: String, exit_code: Option<i32>) {
        *self.last_guard.lock().unwrap() = LastGuardOutput { output, exit_code };
        self.guard_running.store(false, Ordering::SeqCst);
        self.notify(StateEvent::GuardFinished);
    }

    pub fn guard_running(&self) -> bool {
        self.guard_running.load(Ordering::SeqCst)
    }

    pub fn last_guard_output(&self) -> LastGuardOutput {
        self.last_guard.lock().unwrap().clone()
    }

    /// Register for change notifications.
    pub fn subscribe(&self) -> Receiver<StateEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    fn notify(&self, event: StateEvent) {
        // Prune subscribers whose receiver is gone.
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event).is_ok());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GraphNode, NodeKind};

    fn reports_with_one_node() -> Reports {
        Reports {
            graph: WorkspaceGraph {
                nodes: vec![GraphNode {
                    id: "cap-1".to_string(),
                    kind: NodeKind::Capability,
                    title: None,
                    tags: Vec::new(),
                }],
                edges: Vec::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_replace_reports_swaps_snapshot() {
        let state = AppState::new();
        let before = state.graph();
        assert!(before.nodes.is_empty());

        state.replace_reports(reports_with_one_node());

        // Old snapshot is unchanged; new readers see the replacement.
        assert!(before.nodes.is_empty());
        assert_eq!(state.graph().nodes.len(), 1);
    }

    #[test]
    fn test_subscribers_receive_events() {
        let state = AppState::new();
        let rx = state.subscribe();

        state.replace_reports(Reports::default());
        state.set_remote_status(RemoteStatus::Fetching);
        state.set_remote_status(RemoteStatus::Error);

        assert_eq!(rx.recv().unwrap(), StateEvent::ReportsReplaced);
        assert_eq!(rx.recv().unwrap(), StateEvent::RemoteStatusChanged);
        assert_eq!(rx.recv().unwrap(), StateEvent::RemoteStatusChanged);
        assert_eq!(state.remote_status(), RemoteStatus::Error);
    }

    #[test]
    fn test_guard_single_flight() {
        let state = AppState::new();
        assert!(state.begin_guard());
        // Second claim is refused while the first is in flight.
        assert!(!state.begin_guard());
        assert!(state.guard_running());

        state.finish_guard("done".to_string(), Some(0));
        assert!(!state.guard_running());
        assert_eq!(state.last_guard_output().exit_code, Some(0));
        assert!(state.begin_guard());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let state = AppState::new();
        drop(state.subscribe());
        // Must not fail when notifying with a dead receiver around.
        state.replace_reports(Reports::default());
    }
}
