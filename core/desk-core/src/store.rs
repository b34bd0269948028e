//! Snapshot store boundary and the file-backed implementation.
//!
//! The remote document store is abstracted behind [`SnapshotStore`] so the
//! session and the supervisor board never know what backs it. The shipped
//! [`JsonSnapshotStore`] keeps every record in one versioned JSON file:
//!
//! ```json
//! {
//!   "version": 1,
//!   "snapshots": {
//!     "2025-01-02_agent-01": { ... StatusSnapshot fields ... }
//!   }
//! }
//! ```
//!
//! # Defensive Design
//!
//! Reads never fail the caller over a bad file: an empty file, corrupt
//! JSON, or an unsupported version all load as an empty store with a
//! warning. Saves go through a temp file + rename so a crash mid-write
//! cannot leave a truncated document behind.
//!
//! Writes stamp `updatedAt`; the store is the only party that assigns it.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use desk_protocol::{snapshot_key, StatusSnapshot};

use crate::error::{DeskError, Result};

/// Store document schema version. Files with any other version load empty.
pub const STORE_VERSION: u32 = 1;

/// External snapshot document store, keyed by `"{day}_{userId}"`.
///
/// Multi-reader, single effective writer per key; concurrent writers for
/// the same user resolve by last-flush-wins.
pub trait SnapshotStore: Send + Sync {
    fn fetch(&self, day: &str, user_id: &str) -> Result<Option<StatusSnapshot>>;

    /// Upserts the record under its `(day, userId)` key, assigning
    /// `updatedAt`.
    fn put(&self, snapshot: StatusSnapshot) -> Result<()>;

    /// All records whose `day` matches, ordered by user id.
    fn for_day(&self, day: &str) -> Result<Vec<StatusSnapshot>>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    snapshots: HashMap<String, StatusSnapshot>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_VERSION,
            snapshots: HashMap::new(),
        }
    }
}

/// File-backed [`SnapshotStore`]. Each operation reloads the document so
/// several processes on one machine can share the file; the last writer
/// wins, which is the documented resolution for concurrent flushes.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_file(&self) -> StoreFile {
        if !self.path.exists() {
            return StoreFile::default();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "Failed to read snapshot store; treating as empty");
                return StoreFile::default();
            }
        };

        if content.trim().is_empty() {
            return StoreFile::default();
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => file,
            Ok(file) => {
                tracing::warn!(
                    version = file.version,
                    expected = STORE_VERSION,
                    path = %self.path.display(),
                    "Unsupported snapshot store version; treating as empty"
                );
                StoreFile::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "Corrupt snapshot store; treating as empty");
                StoreFile::default()
            }
        }
    }

    fn save_file(&self, file: &StoreFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file).map_err(|err| DeskError::Json {
            context: "serializing snapshot store".to_string(),
            source: err,
        })?;

        let parent = self.path.parent().ok_or_else(|| {
            DeskError::StoreUnavailable(format!(
                "store path {} has no parent directory",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|err| io_error(parent, err))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| io_error(temp.path(), err))?;
        temp.flush().map_err(|err| io_error(temp.path(), err))?;
        temp.persist(&self.path).map_err(|err| DeskError::Io {
            path: self.path.clone(),
            source: err.error,
        })?;

        Ok(())
    }
}

fn io_error(path: &Path, source: impl Into<std::io::Error>) -> DeskError {
    DeskError::Io {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn fetch(&self, day: &str, user_id: &str) -> Result<Option<StatusSnapshot>> {
        let file = self.load_file();
        Ok(file.snapshots.get(&snapshot_key(day, user_id)).cloned())
    }

    fn put(&self, mut snapshot: StatusSnapshot) -> Result<()> {
        let mut file = self.load_file();
        snapshot.updated_at = Some(Utc::now().timestamp_millis());
        file.snapshots.insert(snapshot.key(), snapshot);
        self.save_file(&file)
    }

    fn for_day(&self, day: &str) -> Result<Vec<StatusSnapshot>> {
        let file = self.load_file();
        let mut records: Vec<StatusSnapshot> = file
            .snapshots
            .into_values()
            .filter(|snapshot| snapshot.day == day)
            .collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(records)
    }
}

/// In-memory [`SnapshotStore`] for tests and simulations.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, StatusSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn fetch(&self, day: &str, user_id: &str) -> Result<Option<StatusSnapshot>> {
        let map = self
            .snapshots
            .lock()
            .map_err(|_| DeskError::StoreUnavailable("memory store lock poisoned".to_string()))?;
        Ok(map.get(&snapshot_key(day, user_id)).cloned())
    }

    fn put(&self, mut snapshot: StatusSnapshot) -> Result<()> {
        let mut map = self
            .snapshots
            .lock()
            .map_err(|_| DeskError::StoreUnavailable("memory store lock poisoned".to_string()))?;
        snapshot.updated_at = Some(Utc::now().timestamp_millis());
        map.insert(snapshot.key(), snapshot);
        Ok(())
    }

    fn for_day(&self, day: &str) -> Result<Vec<StatusSnapshot>> {
        let map = self
            .snapshots
            .lock()
            .map_err(|_| DeskError::StoreUnavailable("memory store lock poisoned".to_string()))?;
        let mut records: Vec<StatusSnapshot> = map
            .values()
            .filter(|snapshot| snapshot.day == day)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_protocol::{Role, Status};
    use tempfile::tempdir;

    fn snapshot(user_id: &str, day: &str, status: Status) -> StatusSnapshot {
        StatusSnapshot {
            user_id: user_id.to_string(),
            name: user_id.to_string(),
            role: Role::Agent,
            day: day.to_string(),
            status,
            login_time: 1_735_800_000_000,
            last_status_change_at: 1_735_800_000_000,
            break_used_minutes: 0.0,
            operation_minutes: 0.0,
            meeting_minutes: 0.0,
            handling_minutes: 0.0,
            unavailable_minutes: 0.0,
            updated_at: None,
        }
    }

    #[test]
    fn put_then_fetch_round_trips() {
        let temp = tempdir().expect("temp dir");
        let store = JsonSnapshotStore::new(temp.path().join("snapshots.json"));

        store
            .put(snapshot("agent-01", "2025-01-02", Status::Meeting))
            .expect("put");

        let fetched = store
            .fetch("2025-01-02", "agent-01")
            .expect("fetch")
            .expect("record exists");
        assert_eq!(fetched.status, Status::Meeting);
        assert!(fetched.updated_at.is_some(), "store assigns updatedAt");
    }

    #[test]
    fn fetch_missing_returns_none() {
        let temp = tempdir().expect("temp dir");
        let store = JsonSnapshotStore::new(temp.path().join("snapshots.json"));
        assert!(store.fetch("2025-01-02", "nobody").expect("fetch").is_none());
    }

    #[test]
    fn for_day_filters_and_sorts() {
        let temp = tempdir().expect("temp dir");
        let store = JsonSnapshotStore::new(temp.path().join("snapshots.json"));

        store
            .put(snapshot("agent-02", "2025-01-02", Status::Break))
            .expect("put");
        store
            .put(snapshot("agent-01", "2025-01-02", Status::Operating))
            .expect("put");
        store
            .put(snapshot("agent-03", "2025-01-01", Status::Operating))
            .expect("put");

        let records = store.for_day("2025-01-02").expect("for_day");
        let ids: Vec<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["agent-01", "agent-02"]);
    }

    #[test]
    fn put_overwrites_same_key() {
        let temp = tempdir().expect("temp dir");
        let store = JsonSnapshotStore::new(temp.path().join("snapshots.json"));

        store
            .put(snapshot("agent-01", "2025-01-02", Status::Operating))
            .expect("put");
        store
            .put(snapshot("agent-01", "2025-01-02", Status::Handling))
            .expect("put");

        let records = store.for_day("2025-01-02").expect("for_day");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Handling);
    }

    #[test]
    fn empty_file_loads_as_empty_store() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("snapshots.json");
        std::fs::write(&path, "").expect("write");
        let store = JsonSnapshotStore::new(&path);
        assert!(store.for_day("2025-01-02").expect("for_day").is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty_store() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("snapshots.json");
        std::fs::write(&path, "{not json").expect("write");
        let store = JsonSnapshotStore::new(&path);
        assert!(store.for_day("2025-01-02").expect("for_day").is_empty());
    }

    #[test]
    fn unsupported_version_loads_as_empty_store() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("snapshots.json");
        std::fs::write(&path, r#"{"version":99,"snapshots":{}}"#).expect("write");
        let store = JsonSnapshotStore::new(&path);
        assert!(store.for_day("2025-01-02").expect("for_day").is_empty());
    }

    #[test]
    fn memory_store_behaves_like_file_store() {
        let store = MemorySnapshotStore::new();
        store
            .put(snapshot("agent-01", "2025-01-02", Status::Operating))
            .expect("put");
        assert_eq!(store.len(), 1);
        let fetched = store
            .fetch("2025-01-02", "agent-01")
            .expect("fetch")
            .expect("exists");
        assert!(fetched.updated_at.is_some());
    }
}
