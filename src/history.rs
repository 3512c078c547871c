//! Bounded, persisted guard-run history.
//!
//! Most-recent-first: new records are prepended, the list is truncated
//! to the retention cap, and the capped list is written back through
//! the key-value store after every insertion. Corrupt or absent
//! persisted data seeds an empty history rather than an error.

use crate::models::GuardRunRecord;
use crate::storage::{HISTORY_KEY, KvStore};
use crate::Result;

/// Default retention cap for guard-run records.
pub const DEFAULT_HISTORY_CAP: usize = 200;

/// In-memory guard-run history, mirrored to persistent storage.
#[derive(Debug)]
pub struct GuardHistory {
    records: Vec<GuardRunRecord>,
    cap: usize,
}

impl GuardHistory {
    /// Seed the history from the store. Undecodable bytes are treated
    /// the same as no bytes at all.
    pub fn load(store: &dyn KvStore, cap: usize) -> Self {
        let records = match store.load(HISTORY_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<GuardRunRecord>>(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("discarding corrupt guard history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("could not read guard history: {}", e);
                Vec::new()
            }
        };

        let mut history = Self { records, cap };
        history.records.truncate(history.cap);
        history
    }

    /// Prepend a record, evict past the cap, and persist the full list.
    pub fn push(&mut self, record: GuardRunRecord, store: &mut dyn KvStore) -> Result<()> {
        self.records.insert(0, record);
        self.records.truncate(self.cap);
        let bytes = serde_json::to_vec(&self.records)?;
        store.save(HISTORY_KEY, &bytes)
    }

    /// Records, most recent first.
    pub fn records(&self) -> &[GuardRunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
