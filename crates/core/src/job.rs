// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.
//!
//! A job moves `pending → running → succeeded | failed`. Transitions are
//! monotonic: once terminal, a job record is immutable. The worker that
//! owns a job is the only writer during `running`.

use crate::clock::Clock;
use crate::id::{CredentialId, JobId, ProjectId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet picked up by a worker
    Pending,
    /// A worker owns the job and its process may be executing
    Running,
    /// Process exited zero within the timeout
    Succeeded,
    /// Any execution-path error, non-zero exit, or timeout kill
    Failed,
}

impl JobStatus {
    /// Check if this status permits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        })
    }
}

/// How the job was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchType {
    Manual,
    Scheduled,
    Dependency,
}

/// What kind of work the job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Refresh a project's source checkout
    Update,
    /// Run a project task
    Run,
}

/// Attempted an illegal status transition.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid job status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Inputs for creating a new job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub description: String,
    pub launch_type: LaunchType,
    pub kind: JobKind,
    pub playbook: String,
    pub verbosity: u8,
    pub project_id: ProjectId,
    pub credential_id: Option<CredentialId>,
    pub extra_vars: BTreeMap<String, serde_json::Value>,
    pub created_by: Option<UserId>,
}

/// A unit of work: one supervised external process execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub description: String,
    pub launch_type: LaunchType,
    pub kind: JobKind,
    /// Target task identifier handed to the playbook runner
    pub playbook: String,
    pub verbosity: u8,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<CredentialId>,
    /// Open key→value map passed to the executed process as JSON
    #[serde(default)]
    pub extra_vars: BTreeMap<String, serde_json::Value>,
    pub status: JobStatus,
    /// Human-readable failure reason (failure transitions only)
    #[serde(default)]
    pub explanation: String,
    /// Combined captured stdout+stderr of the executed process
    #[serde(default)]
    pub output: String,
    /// Recorded argument vector, for auditability
    #[serde(default)]
    pub args: Vec<String>,
    /// Recorded environment snapshot (never contains secret values)
    #[serde(default)]
    pub env: Vec<String>,
    /// Advisory only; cancellation is realized through the timeout kill
    #[serde(default)]
    pub cancel_flag: bool,
    pub created_ms: u64,
    pub modified_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<UserId>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id: JobId::generate(),
            name: config.name,
            description: config.description,
            launch_type: config.launch_type,
            kind: config.kind,
            playbook: config.playbook,
            verbosity: config.verbosity,
            project_id: config.project_id,
            credential_id: config.credential_id,
            extra_vars: config.extra_vars,
            status: JobStatus::Pending,
            explanation: String::new(),
            output: String::new(),
            args: Vec::new(),
            env: Vec::new(),
            cancel_flag: false,
            created_ms: now,
            modified_ms: now,
            modified_by: config.created_by.clone(),
            created_by: config.created_by,
        }
    }

    fn transition(&mut self, next: JobStatus, clock: &impl Clock) -> Result<(), StateError> {
        if !self.status.can_transition(next) {
            return Err(StateError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.modified_ms = clock.epoch_ms();
        Ok(())
    }

    /// Claim the job for execution: `pending → running`.
    pub fn begin(&mut self, clock: &impl Clock) -> Result<(), StateError> {
        self.transition(JobStatus::Running, clock)
    }

    /// Terminal success: `running → succeeded`, attaching the captured output.
    pub fn succeed(&mut self, output: String, clock: &impl Clock) -> Result<(), StateError> {
        self.transition(JobStatus::Succeeded, clock)?;
        self.output = output;
        Ok(())
    }

    /// Terminal failure: `running → failed`, attaching the reason and any
    /// output captured before the failure.
    pub fn fail(
        &mut self,
        explanation: impl Into<String>,
        output: String,
        clock: &impl Clock,
    ) -> Result<(), StateError> {
        self.transition(JobStatus::Failed, clock)?;
        self.explanation = explanation.into();
        self.output = output;
        Ok(())
    }

    /// Record the exact argument vector and environment handed to the
    /// process, before it starts.
    pub fn record_command(&mut self, args: Vec<String>, env: Vec<String>) {
        self.args = args;
        self.env = env;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
pub(crate) mod tests;
