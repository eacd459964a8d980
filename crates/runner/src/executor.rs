// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-job execution pipeline.
//!
//! Drives one execution context from `pending` to a terminal state:
//! decrypt secrets, load keys into an ephemeral agent, run the process
//! under the timeout, persist the outcome. Every error is captured into
//! the job record; nothing here ever takes down a worker.

use crate::command::build_update_command;
use crate::execute::{run, RunError};
use crate::store::JobStore;
use hoist_agent::SshAgentSession;
use hoist_core::{Clock, ExecutionContext, Job, Settings, SystemClock};
use hoist_vault::Vault;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::sync::Arc;

/// A job-level failure: explanation plus whatever output was captured.
struct Failure {
    explanation: String,
    output: String,
}

impl Failure {
    fn new(explanation: impl Into<String>) -> Self {
        Self { explanation: explanation.into(), output: String::new() }
    }

    fn from_run(err: RunError) -> Self {
        let output = err.output().unwrap_or_default().to_string();
        Self { explanation: err.to_string(), output }
    }
}

/// Executes one job end-to-end on behalf of a worker.
pub struct JobExecutor<C: Clock = SystemClock> {
    store: Arc<dyn JobStore>,
    vault: Vault,
    settings: Settings,
    clock: C,
}

impl<C: Clock> JobExecutor<C> {
    pub fn new(store: Arc<dyn JobStore>, vault: Vault, settings: Settings, clock: C) -> Self {
        Self { store, vault, settings, clock }
    }

    /// Run one execution context to a terminal job state.
    ///
    /// Redelivered contexts whose job already reached a terminal state
    /// are skipped (the queue is at-least-once).
    pub async fn execute(&self, mut ctx: ExecutionContext) {
        if let Ok(Some(stored)) = self.store.load(&ctx.job.id) {
            if stored.is_terminal() {
                tracing::info!(job = %ctx.job.id, "skipping redelivered terminal job");
                return;
            }
        }

        if let Err(err) = ctx.job.begin(&self.clock) {
            tracing::warn!(job = %ctx.job.id, %err, "refusing execution context");
            return;
        }
        self.persist(&ctx.job);
        tracing::info!(job = %ctx.job.id, name = %ctx.job.name, "started job");

        let mut session: Option<SshAgentSession> = None;
        let result = self.run_pipeline(&mut ctx, &mut session).await;

        // Scoped-resource discipline: the agent and its socket are gone
        // before the worker returns to the pool, on every path.
        if let Some(session) = session.take() {
            session.release().await;
        }

        let outcome = match result {
            Ok(output) => ctx.job.succeed(output, &self.clock),
            Err(failure) => {
                tracing::warn!(job = %ctx.job.id, explanation = %failure.explanation, "job failed");
                ctx.job.fail(failure.explanation, failure.output, &self.clock)
            }
        };
        if let Err(err) = outcome {
            tracing::error!(job = %ctx.job.id, %err, "illegal terminal transition");
            return;
        }
        self.persist(&ctx.job);
        tracing::info!(job = %ctx.job.id, status = %ctx.job.status, "job finished");
    }

    async fn run_pipeline(
        &self,
        ctx: &mut ExecutionContext,
        session: &mut Option<SshAgentSession>,
    ) -> Result<String, Failure> {
        let project_path = ctx.project.local_path(&self.settings.projects_home);
        create_project_dir(&project_path)
            .map_err(|err| Failure::new(format!("failed to create project directory: {err}")))?;

        let mut material = None;
        if let Some(credential) = &ctx.credential {
            let secrets =
                self.vault.decrypt(credential).map_err(|err| Failure::new(err.to_string()))?;

            if let Some(key) = secrets.ssh_key.as_deref() {
                let agent = SshAgentSession::start(&self.settings.agent_runtime_dir())
                    .await
                    .map_err(|err| Failure::new(err.to_string()))?;
                let added = agent.add_key(key, secrets.ssh_key_unlock.as_deref()).await;
                // Stash before checking so a failed add still releases the agent
                *session = Some(agent);
                added.map_err(|err| Failure::new(err.to_string()))?;
            }
            material = Some(secrets);
        }

        let agent_endpoint = session.as_ref().map(|agent| (agent.socket_path(), agent.pid()));
        let spec = build_update_command(&ctx.job, &ctx.project, &self.settings, agent_endpoint)
            .map_err(|err| Failure::new(err.to_string()))?;
        ctx.job.record_command(spec.display_args(), spec.display_env());
        self.persist(&ctx.job);

        // Password auth only applies when there is no key for the agent
        let stdin_secret = material
            .as_ref()
            .filter(|secrets| !secrets.has_ssh_key())
            .and_then(|secrets| secrets.password.clone());

        run(&spec, stdin_secret.as_deref(), self.settings.job_timeout)
            .await
            .map_err(Failure::from_run)
    }

    /// Best-effort persistence: a failure after a terminal decision is
    /// logged with the job id for manual reconciliation, never raised.
    fn persist(&self, job: &Job) {
        if let Err(err) = self.store.save(job) {
            tracing::error!(job = %job.id, %err, "failed to persist job state");
        }
    }
}

/// Create the project checkout directory, owner-only, idempotently.
fn create_project_dir(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
