//! Per-device day cache.
//!
//! One snapshot record under a fixed path, used only for same-day,
//! same-device resume. It is a recovery fallback, never an authority: a
//! record for another user or another day is ignored by recovery, and a
//! missing or corrupt file simply means "no cached state".

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::NamedTempFile;

use desk_protocol::StatusSnapshot;

use crate::error::{DeskError, Result};

pub struct DayCache {
    path: PathBuf,
}

impl DayCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached record, if any. All failure modes read as `None`.
    pub fn load(&self) -> Option<StatusSnapshot> {
        if !self.path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "Failed to read day cache");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "Corrupt day cache ignored");
                None
            }
        }
    }

    /// Replaces the cached record atomically.
    pub fn save(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot).map_err(|err| DeskError::Json {
            context: "serializing day cache".to_string(),
            source: err,
        })?;

        let parent = self.path.parent().ok_or_else(|| {
            DeskError::StoreUnavailable(format!(
                "cache path {} has no parent directory",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|err| DeskError::Io {
            path: parent.to_path_buf(),
            source: err,
        })?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|err| DeskError::Io {
            path: parent.to_path_buf(),
            source: err,
        })?;
        temp.write_all(content.as_bytes())
            .map_err(|err| DeskError::Io {
                path: temp.path().to_path_buf(),
                source: err,
            })?;
        temp.persist(&self.path).map_err(|err| DeskError::Io {
            path: self.path.clone(),
            source: err.error,
        })?;

        Ok(())
    }
}
