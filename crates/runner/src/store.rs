// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted job records.
//!
//! One writer per job id (the owning worker), so the store only needs to
//! keep individual writes atomic: records are written to a temp file and
//! renamed into place.

use hoist_core::{Job, JobId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to persist job record")]
    PersistenceFailed(#[source] std::io::Error),
    #[error("corrupt job record {id}")]
    CorruptRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Collaborator contract with job persistence.
pub trait JobStore: Send + Sync {
    fn save(&self, job: &Job) -> Result<(), StoreError>;
    fn load(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    fn list_ids(&self) -> Result<Vec<JobId>, StoreError>;
}

/// Job records as JSON files under a directory.
pub struct FsJobStore {
    dir: PathBuf,
}

impl FsJobStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(StoreError::PersistenceFailed)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl JobStore for FsJobStore {
    fn save(&self, job: &Job) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(job).map_err(|err| {
            StoreError::PersistenceFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                err,
            ))
        })?;
        let path = self.record_path(&job.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(StoreError::PersistenceFailed)?;
        std::fs::rename(&tmp, &path).map_err(StoreError::PersistenceFailed)?;
        Ok(())
    }

    fn load(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        let path = self.record_path(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::PersistenceFailed(err)),
        };
        let job = serde_json::from_str(&contents).map_err(|source| StoreError::CorruptRecord {
            id: id.as_str().to_string(),
            source,
        })?;
        Ok(Some(job))
    }

    fn list_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(StoreError::PersistenceFailed)?;
        for entry in entries {
            let entry = entry.map_err(StoreError::PersistenceFailed)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(JobId::from(id));
            }
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<String, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn save(&self, job: &Job) -> Result<(), StoreError> {
        self.records.lock().insert(job.id.as_str().to_string(), job.clone());
        Ok(())
    }

    fn load(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.records.lock().get(id.as_str()).cloned())
    }

    fn list_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids: Vec<JobId> =
            self.records.lock().keys().map(|id| JobId::from(id.as_str())).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
