//! Run history
//!
//! Every successful run is recorded, newest first, capped at
//! [`HISTORY_CAP`] entries. The list is rehydrated from storage on startup
//! and written back after each mutation; persistence failures are logged and
//! otherwise ignored so a broken disk never blocks running code.

use crate::language::Language;
use crate::step::ExecutionStep;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const HISTORY_KEY: &str = "run_history";
pub const HISTORY_CAP: usize = 50;

/// One recorded run, complete enough to restore the timeline exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistoryEntry {
    pub id: Uuid,
    pub code: String,
    pub language: Language,
    pub steps: Vec<ExecutionStep>,
    /// Timeline position when the run was recorded (-1 = no steps).
    pub current_index: isize,
    pub timestamp_ms: u64,
}

pub struct RunHistoryStore<S: Storage> {
    storage: S,
    entries: Vec<RunHistoryEntry>,
}

impl<S: Storage> RunHistoryStore<S> {
    /// Open the store, rehydrating whatever the storage holds. Corrupt or
    /// missing data starts an empty history.
    pub fn new(storage: S) -> Self {
        let entries = storage
            .get(HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(error = %e, "run history is corrupt; starting fresh");
                    None
                }
            })
            .unwrap_or_default();
        RunHistoryStore { storage, entries }
    }

    pub fn entries(&self) -> &[RunHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a run at the front of the history and persist.
    pub fn add(
        &mut self,
        code: String,
        language: Language,
        steps: Vec<ExecutionStep>,
        current_index: isize,
    ) -> Uuid {
        let entry = RunHistoryEntry {
            id: Uuid::new_v4(),
            code,
            language,
            steps,
            current_index,
            timestamp_ms: now_ms(),
        };
        let id = entry.id;
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        self.persist();
        id
    }

    pub fn restore(&self, id: Uuid) -> Option<&RunHistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            tracing::warn!(error = %e, "failed to clear persisted run history");
        }
    }

    fn persist(&mut self) {
        let serialized = match serde_json::to_string(&self.entries) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize run history");
                return;
            }
        };
        if let Err(e) = self.storage.set(HISTORY_KEY, &serialized) {
            tracing::warn!(error = %e, "failed to persist run history");
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{LineStep, Scope};
    use crate::storage::MemoryStorage;

    fn steps() -> Vec<ExecutionStep> {
        vec![ExecutionStep::Line(LineStep {
            step: 0,
            line: 1,
            scope: Scope::default(),
            issues: Vec::new(),
        })]
    }

    #[test]
    fn newest_entry_is_first() {
        let mut store = RunHistoryStore::new(MemoryStorage::new());
        store.add("a = 1".into(), Language::Python, steps(), 0);
        let second = store.add("b = 2".into(), Language::Python, steps(), 0);
        assert_eq!(store.entries()[0].id, second);
        assert_eq!(store.entries()[0].code, "b = 2");
    }

    #[test]
    fn history_is_capped() {
        let mut store = RunHistoryStore::new(MemoryStorage::new());
        for i in 0..60 {
            store.add(format!("x = {}", i), Language::Python, steps(), 0);
        }
        assert_eq!(store.len(), HISTORY_CAP);
        // The newest entries survive the cap.
        assert_eq!(store.entries()[0].code, "x = 59");
    }

    #[test]
    fn restore_by_id() {
        let mut store = RunHistoryStore::new(MemoryStorage::new());
        let id = store.add("a = 1".into(), Language::Python, steps(), 0);
        let entry = store.restore(id).unwrap();
        assert_eq!(entry.code, "a = 1");
        assert_eq!(entry.current_index, 0);
        assert!(store.restore(Uuid::new_v4()).is_none());
    }

    #[test]
    fn rehydrates_from_storage() {
        let mut storage = MemoryStorage::new();
        {
            let mut store = RunHistoryStore::new(std::mem::take(&mut storage));
            store.add("a = 1".into(), Language::Python, steps(), 0);
            storage = store.storage;
        }
        let store = RunHistoryStore::new(storage);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].code, "a = 1");
    }

    #[test]
    fn corrupt_storage_starts_fresh() {
        let mut storage = MemoryStorage::new();
        storage.set(HISTORY_KEY, "not json").unwrap();
        let store = RunHistoryStore::new(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let mut store = RunHistoryStore::new(MemoryStorage::new());
        store.add("a = 1".into(), Language::Python, steps(), 0);
        store.clear();
        assert!(store.is_empty());
    }
}
