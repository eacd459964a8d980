// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner settings.
//!
//! An explicitly constructed value passed down to every component; there
//! is no package-level mutable configuration state.

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock limit for one job execution.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Configuration for the execution pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding per-project checkouts
    pub projects_home: PathBuf,
    /// Directory for queue journal, job records, and agent sockets
    pub state_dir: PathBuf,
    /// Wall-clock limit per job; on expiry the process is killed
    pub job_timeout: Duration,
    /// Number of concurrent workers in the dispatcher pool
    pub workers: usize,
    /// Playbook runner executable
    pub playbook_command: PathBuf,
}

impl Settings {
    /// Settings rooted at a state directory, with defaults for the rest.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            projects_home: state_dir.join("projects"),
            state_dir,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            workers: DEFAULT_WORKERS,
            playbook_command: PathBuf::from("ansible-playbook"),
        }
    }

    /// Path of the queue's append-only journal.
    pub fn queue_journal_path(&self) -> PathBuf {
        self.state_dir.join("queue.journal")
    }

    /// Directory of persisted job records.
    pub fn jobs_dir(&self) -> PathBuf {
        self.state_dir.join("jobs")
    }

    /// Directory of persisted credential records.
    pub fn credentials_dir(&self) -> PathBuf {
        self.state_dir.join("credentials")
    }

    /// Directory where per-job agent control sockets live.
    pub fn agent_runtime_dir(&self) -> PathBuf {
        self.state_dir.join("agent")
    }
}
