//! Write side of the page logs.
//!
//! Append is a whole-artifact read-modify-write: load (tolerantly), push,
//! sort newest-first, truncate to the retention cap, then replace the file
//! through a staging rename so a concurrent reader never observes a
//! partial write. Two requests finishing the same slug at once race
//! last-writer-wins — acceptable for a single developer's local session,
//! and either outcome is a complete, valid artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::repository;
use super::ProfileRecord;
use crate::error::{ProfilerError, Result};

pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append `record` to the page log for `slug`, keeping at most
    /// `retention_count` newest entries. Returns the resulting log length.
    pub fn append(
        &self,
        slug: &str,
        record: ProfileRecord,
        retention_count: usize,
    ) -> Result<usize> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ProfilerError::Storage(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let path = self.dir.join(format!("{slug}.json"));

        let mut log = if path.exists() {
            match repository::load_page_log(&path) {
                Ok(records) => records,
                Err(err) => {
                    // unrepairable log: start over rather than refuse to record
                    warn!(%slug, error = %err, "discarding unreadable page log");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // front insert + stable sort: on a timestamp tie the fresh record
        // still wins the retention cut
        log.insert(0, record);
        log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        log.truncate(retention_count);

        let json = serde_json::to_string_pretty(&log)
            .map_err(|e| ProfilerError::Storage(format!("cannot serialize page log: {e}")))?;

        // stage + rename so readers only ever see a fully-written file
        let staging = self.dir.join(format!("{slug}.json.tmp"));
        fs::write(&staging, json).map_err(|e| {
            ProfilerError::Storage(format!("cannot write {}: {e}", staging.display()))
        })?;
        fs::rename(&staging, &path).map_err(|e| {
            ProfilerError::Storage(format!("cannot replace {}: {e}", path.display()))
        })?;

        Ok(log.len())
    }
}

// ─── Tests ───────────────────────────────────────────────────────
