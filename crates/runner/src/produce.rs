// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Producer side: turn an update request into a queued execution context.

use crate::queue::{JobQueue, QueueError};
use crate::store::{JobStore, StoreError};
use hoist_core::{
    Clock, ContextError, ExecutionContext, Job, JobConfig, JobKind, LaunchType, Project, Settings,
    UserId,
};
use hoist_vault::{Vault, VaultError};
use std::collections::BTreeMap;

/// Playbook executed by update jobs.
pub const UPDATE_PLAYBOOK: &str = "project_update.yml";

#[derive(Debug, thiserror::Error)]
pub enum ProduceError {
    #[error("failed to persist new job")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] VaultError),
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The job was persisted as pending but never published; it can be
    /// resubmitted once the queue is back.
    #[error("job queue unavailable")]
    QueueUnavailable(#[source] QueueError),
}

/// Create and enqueue an update job for a project's source checkout.
///
/// The job is persisted as pending first, then its execution context
/// (with the project's still-encrypted SCM credential, when one is
/// referenced) is published. A publish failure surfaces synchronously and
/// leaves the pending record behind — a job is only committed to "will
/// run" by a successful publish.
pub fn update_project(
    project: &Project,
    actor: Option<&UserId>,
    store: &dyn JobStore,
    vault: &Vault,
    queue: &JobQueue,
    settings: &Settings,
    clock: &impl Clock,
) -> Result<Job, ProduceError> {
    let project_path = project.local_path(&settings.projects_home);
    let branch =
        if project.scm_branch.is_empty() { "HEAD" } else { project.scm_branch.as_str() };

    let mut extra_vars = BTreeMap::new();
    extra_vars.insert("scm_branch".to_string(), serde_json::json!(branch));
    extra_vars.insert("scm_type".to_string(), serde_json::json!(project.scm_type.to_string()));
    extra_vars
        .insert("project_path".to_string(), serde_json::json!(project_path.display().to_string()));
    extra_vars.insert("scm_clean".to_string(), serde_json::json!(project.scm_clean));
    extra_vars.insert("scm_url".to_string(), serde_json::json!(project.scm_url));
    extra_vars.insert(
        "scm_delete_on_update".to_string(),
        serde_json::json!(project.scm_delete_on_update),
    );
    extra_vars.insert("scm_accept_hostkey".to_string(), serde_json::json!(true));

    let job = Job::new(
        JobConfig {
            name: format!("{} update job", project.name),
            description: format!("updates the {} project checkout", project.name),
            launch_type: LaunchType::Manual,
            kind: JobKind::Update,
            playbook: UPDATE_PLAYBOOK.to_string(),
            verbosity: 0,
            project_id: project.id.clone(),
            credential_id: project.scm_credential_id.clone(),
            extra_vars,
            created_by: actor.cloned(),
        },
        clock,
    );
    store.save(&job)?;

    let credential = match &job.credential_id {
        Some(id) => Some(vault.resolve(id)?),
        None => None,
    };

    let ctx = ExecutionContext { job: job.clone(), project: project.clone(), credential };
    let payload = ctx.encode()?;
    queue.publish(&payload).map_err(ProduceError::QueueUnavailable)?;

    tracing::info!(job = %job.id, project = %project.id, "queued update job");
    Ok(job)
}

#[cfg(test)]
#[path = "produce_tests.rs"]
mod tests;
