//! Source resolution: ordered fallback across snapshot files and remote
//! mirrors.
//!
//! Each report kind has a list of candidate file names. Sources are
//! tried in order; the first one that is both readable and decodable
//! wins. When everything fails the report's empty default is returned;
//! "no data yet" is a state, not an error.

use serde::Serialize;
use std::cell::Cell;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::decode;
use crate::models::{AgentRunEntry, CapabilityHealthReport, TokenDriftReport, WorkspaceGraph};
use crate::{Error, Result};

/// The report types masthead knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Graph,
    CapabilityHealth,
    TokenDrift,
    Runs,
}

impl ReportKind {
    /// Candidate file names under a source, in priority order.
    ///
    /// Run history has two logical names: the newline-delimited envelope
    /// stream is preferred over the single-document form.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Graph => &["graph.json"],
            Self::CapabilityHealth => &["capability-health.json"],
            Self::TokenDrift => &["token-drift.json"],
            Self::Runs => &["run-envelopes.jsonl", "agent-runs.json"],
        }
    }
}

/// A byte-providing source for reports.
#[derive(Debug, Clone)]
pub enum Source {
    /// Local snapshot directory holding the report files.
    Snapshot(PathBuf),
    /// Remote mirror serving `<base>/<name>` over HTTP-style GET.
    Remote(String),
}

/// Progress of the most recent remote fetch attempt.
///
/// Transitions forward only (`Fetching` -> `Ok` | `Error`); a new fetch
/// starts a fresh attempt. Overlapping fetches resolve last-writer-wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    #[default]
    Idle,
    Fetching,
    Ok,
    Error,
}

/// Contract for fetching bytes from a URL. Success requires a 2xx.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production fetcher backed by a ureq agent with a bounded timeout.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Error::Unreachable(format!("{}: {}", url, e)))?;

        // ureq only turns 4xx/5xx into errors; a 3xx that survives (a
        // 304, an unfollowable redirect) still lands here. Only a 2xx
        // counts as a reachable mirror.
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(Error::Unreachable(format!("{}: HTTP {}", url, status)));
        }

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Unreachable(format!("{}: {}", url, e)))?;
        Ok(bytes)
    }
}

/// All reports loaded in one pass.
#[derive(Debug, Clone, Default)]
pub struct Reports {
    pub graph: WorkspaceGraph,
    pub health: CapabilityHealthReport,
    pub drift: TokenDriftReport,
    pub runs: Vec<AgentRunEntry>,
}

/// Resolves reports against an ordered source list.
pub struct SourceResolver<'a> {
    sources: Vec<Source>,
    fetcher: Option<&'a dyn Fetcher>,
    remote_attempted: Cell<bool>,
    remote_succeeded: Cell<bool>,
}

impl<'a> SourceResolver<'a> {
    /// Build a resolver over the given sources. A fetcher is only needed
    /// when the source list contains remote mirrors.
    pub fn new(sources: Vec<Source>, fetcher: Option<&'a dyn Fetcher>) -> Self {
        Self {
            sources,
            fetcher,
            remote_attempted: Cell::new(false),
            remote_succeeded: Cell::new(false),
        }
    }

    /// Outcome of remote reads so far: `Ok` once any remote fetch
    /// succeeded, `Error` when remote was tried and never succeeded,
    /// `None` when no remote source was in play.
    pub fn remote_outcome(&self) -> Option<RemoteStatus> {
        if !self.remote_attempted.get() {
            None
        } else if self.remote_succeeded.get() {
            Some(RemoteStatus::Ok)
        } else {
            Some(RemoteStatus::Error)
        }
    }

    /// Load every report kind, falling back per kind independently.
    pub fn load_reports(&self) -> Reports {
        Reports {
            graph: self
                .load_with(ReportKind::Graph, decode::decode_graph)
                .unwrap_or_default(),
            health: self
                .load_with(ReportKind::CapabilityHealth, decode::decode_health)
                .unwrap_or_default(),
            drift: self
                .load_with(ReportKind::TokenDrift, decode::decode_drift)
                .unwrap_or_default(),
            runs: self.load_runs(),
        }
    }

    /// Load one single-object report through the first working source.
    fn load_with<T>(&self, kind: ReportKind, decode: fn(&[u8]) -> Result<T>) -> Option<T> {
        for source in &self.sources {
            for name in kind.candidates() {
                let bytes = match self.read(source, name) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::debug!("source skipped for {}: {}", name, e);
                        continue;
                    }
                };
                match decode(&bytes) {
                    Ok(value) => {
                        tracing::debug!("loaded {} from {:?}", name, source);
                        return Some(value);
                    }
                    Err(e) => tracing::warn!("decode failed for {}: {}", name, e),
                }
            }
        }
        None
    }

    /// Load run history. Unlike the single-object reports, an empty
    /// decode result does not satisfy a source; the next one is tried.
    fn load_runs(&self) -> Vec<AgentRunEntry> {
        for source in &self.sources {
            for name in ReportKind::Runs.candidates() {
                let bytes = match self.read(source, name) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::debug!("source skipped for {}: {}", name, e);
                        continue;
                    }
                };
                let runs = decode::decode_runs(&bytes);
                if !runs.is_empty() {
                    tracing::debug!("loaded {} run entries from {}", runs.len(), name);
                    return runs;
                }
            }
        }
        Vec::new()
    }

    /// Read the named report from one source.
    fn read(&self, source: &Source, name: &str) -> Result<Vec<u8>> {
        match source {
            Source::Snapshot(dir) => read_snapshot(dir, name),
            Source::Remote(base) => {
                self.remote_attempted.set(true);
                let fetcher = self
                    .fetcher
                    .ok_or_else(|| Error::Unreachable("no fetcher configured".to_string()))?;
                let url = format!("{}/{}", base.trim_end_matches('/'), name);
                let bytes = fetcher.fetch(&url)?;
                self.remote_succeeded.set(true);
                Ok(bytes)
            }
        }
    }
}

fn read_snapshot(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    std::fs::read(&path).map_err(|e| Error::Unreachable(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    /// Fetcher stub that serves canned responses per URL suffix.
    struct FakeFetcher {
        responses: Vec<(&'static str, Result<Vec<u8>>)>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            for (suffix, response) in &self.responses {
                if url.ends_with(suffix) {
                    return match response {
                        Ok(bytes) => Ok(bytes.clone()),
                        Err(_) => Err(Error::Unreachable(format!("{}: HTTP 500", url))),
                    };
                }
            }
            Err(Error::Unreachable(format!("{}: HTTP 404", url)))
        }
    }

    fn snapshot_resolver(env: &TestEnv) -> SourceResolver<'static> {
        SourceResolver::new(vec![Source::Snapshot(env.path().join("reports"))], None)
    }

    /// Serve one canned HTTP response on a loopback port.
    fn serve_once(response: &'static str) -> String {
        use std::io::{Read as _, Write as _};
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/graph.json", addr)
    }

    #[test]
    fn test_http_fetcher_accepts_2xx() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        );
        let fetcher = HttpFetcher::new(std::time::Duration::from_secs(5));
        assert_eq!(fetcher.fetch(&url).unwrap(), b"{}");
    }

    #[test]
    fn test_http_fetcher_rejects_non_2xx_success_statuses() {
        // ureq passes a 304 through as Ok; it must not count as a
        // reachable mirror.
        let url = serve_once(
            "HTTP/1.1 304 Not Modified\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let fetcher = HttpFetcher::new(std::time::Duration::from_secs(5));
        match fetcher.fetch(&url) {
            Err(Error::Unreachable(message)) => assert!(message.contains("304")),
            other => panic!("expected unreachable error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_snapshot_yields_defaults() {
        let env = TestEnv::new();
        let reports = snapshot_resolver(&env).load_reports();

        assert!(reports.graph.nodes.is_empty());
        assert!(reports.health.entries.is_empty());
        assert_eq!(reports.drift.drift, None);
        assert!(reports.runs.is_empty());
    }

    #[test]
    fn test_snapshot_load() {
        let env = TestEnv::new();
        env.write_report(
            "graph.json",
            r#"{"nodes":[{"id":"cap-1","kind":"capability"}],"edges":[]}"#,
        );
        env.write_report(
            "capability-health.json",
            r#"{"entries":[{"id":"cap-1","status":"ok"}]}"#,
        );
        env.write_report("token-drift.json", r#"{"drift":true}"#);
        env.write_report("run-envelopes.jsonl", "{\"id\":\"run-1\"}\n");

        let reports = snapshot_resolver(&env).load_reports();
        assert_eq!(reports.graph.nodes.len(), 1);
        assert_eq!(reports.health.entries.len(), 1);
        assert_eq!(reports.drift.drift, Some(true));
        assert_eq!(reports.runs.len(), 1);
    }

    #[test]
    fn test_snapshot_load_is_deterministic() {
        let env = TestEnv::new();
        env.write_report(
            "graph.json",
            r#"{"nodes":[{"id":"b"},{"id":"a"}],"edges":[{"from":"a","to":"b","type":"x"}]}"#,
        );

        let first = snapshot_resolver(&env).load_reports();
        let second = snapshot_resolver(&env).load_reports();
        assert_eq!(
            serde_json::to_string(&first.graph).unwrap(),
            serde_json::to_string(&second.graph).unwrap()
        );
    }

    #[test]
    fn test_runs_falls_through_to_single_document() {
        let env = TestEnv::new();
        // The preferred jsonl name is absent; agent-runs.json serves.
        env.write_report("agent-runs.json", r#"[{"id":"run-1"},{"id":"run-2"}]"#);

        let reports = snapshot_resolver(&env).load_reports();
        assert_eq!(reports.runs.len(), 2);
    }

    #[test]
    fn test_malformed_single_report_falls_back_to_default() {
        let env = TestEnv::new();
        env.write_report("token-drift.json", "::garbage::");

        let reports = snapshot_resolver(&env).load_reports();
        assert_eq!(reports.drift.drift, None);
    }

    #[test]
    fn test_remote_error_falls_back_to_snapshot() {
        let env = TestEnv::new();
        env.write_report(
            "graph.json",
            r#"{"nodes":[{"id":"local-1"}],"edges":[]}"#,
        );

        // Every remote request fails; the local snapshot must win.
        let fetcher = FakeFetcher { responses: vec![] };
        let resolver = SourceResolver::new(
            vec![
                Source::Remote("https://mirror.invalid/reports".to_string()),
                Source::Snapshot(env.path().join("reports")),
            ],
            Some(&fetcher),
        );

        let reports = resolver.load_reports();
        assert_eq!(reports.graph.nodes.len(), 1);
        assert_eq!(reports.graph.nodes[0].id, "local-1");
        assert_eq!(resolver.remote_outcome(), Some(RemoteStatus::Error));
    }

    #[test]
    fn test_remote_outcome_none_without_remote_source() {
        let env = TestEnv::new();
        let resolver = snapshot_resolver(&env);
        resolver.load_reports();
        assert_eq!(resolver.remote_outcome(), None);
    }

    #[test]
    fn test_remote_wins_when_reachable() {
        let env = TestEnv::new();
        env.write_report(
            "graph.json",
            r#"{"nodes":[{"id":"local-1"}],"edges":[]}"#,
        );

        let fetcher = FakeFetcher {
            responses: vec![(
                "graph.json",
                Ok(br#"{"nodes":[{"id":"remote-1"}],"edges":[]}"#.to_vec()),
            )],
        };
        let resolver = SourceResolver::new(
            vec![
                Source::Remote("https://mirror.invalid/reports".to_string()),
                Source::Snapshot(env.path().join("reports")),
            ],
            Some(&fetcher),
        );

        let reports = resolver.load_reports();
        assert_eq!(reports.graph.nodes[0].id, "remote-1");
        assert_eq!(resolver.remote_outcome(), Some(RemoteStatus::Ok));
    }
}
