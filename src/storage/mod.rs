//! Persistence layer for Masthead.
//!
//! Guard-run history is the only thing masthead persists, and it does
//! so through a narrow load/save-bytes contract so the history code
//! never knows where the bytes live. The default backend is a file per
//! key under `~/.local/share/masthead/<workspace-hash>/`, the same
//! external-data-dir scheme the rest of the workspace tooling uses.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fixed key the guard-run history is persisted under.
pub const HISTORY_KEY: &str = "guard-history";

/// Key-value persistence contract: load/save raw bytes under a key.
pub trait KvStore {
    /// Load the bytes stored under `key`, or `None` when absent.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// File-backed store: one file per key in the workspace's data dir.
pub struct FileStore {
    /// Root directory for this workspace's data
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store for the given workspace.
    pub fn open(workspace: &Path) -> Result<Self> {
        let data_dir = resolve_data_dir()?;
        Self::open_with_data_dir(workspace, &data_dir)
    }

    /// Open a store rooted under an explicit data directory.
    ///
    /// Used by tests to keep storage isolated from the user's
    /// `~/.local/share/masthead/`.
    pub fn open_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        let root = data_dir.join(workspace_hash(workspace));
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KvStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.key_path(key);
        fs::write(&path, bytes)?;
        Ok(())
    }
}

/// Resolve the masthead data directory: `MH_DATA_DIR` override first,
/// then the platform data dir.
fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MH_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("masthead"))
}

/// Short content hash of the canonicalized workspace path, so distinct
/// workspaces never share a store.
fn workspace_hash(workspace: &Path) -> String {
    let canonical = workspace
        .canonicalize()
        .unwrap_or_else(|_| workspace.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_load_absent_key_is_none() {
        let env = TestEnv::new();
        let store = env.store();
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let env = TestEnv::new();
        let mut store = env.store();
        store.save(HISTORY_KEY, b"[1,2,3]").unwrap();
        assert_eq!(store.load(HISTORY_KEY).unwrap().unwrap(), b"[1,2,3]");
    }

    #[test]
    fn test_save_replaces_previous_value() {
        let env = TestEnv::new();
        let mut store = env.store();
        store.save(HISTORY_KEY, b"old").unwrap();
        store.save(HISTORY_KEY, b"new").unwrap();
        assert_eq!(store.load(HISTORY_KEY).unwrap().unwrap(), b"new");
    }

    #[test]
    fn test_distinct_workspaces_get_distinct_roots() {
        let env = TestEnv::new();
        let other = tempfile::TempDir::new().unwrap();

        let store_a =
            FileStore::open_with_data_dir(env.path(), env.data_dir.path()).unwrap();
        let store_b =
            FileStore::open_with_data_dir(other.path(), env.data_dir.path()).unwrap();
        assert_ne!(store_a.root(), store_b.root());
    }
}
