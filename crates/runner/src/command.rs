// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic command and environment construction.
//!
//! The child environment is fully specified: nothing is inherited from
//! the daemon except HOME. This is a security and determinism boundary —
//! the executed process must never see the parent's environment.

use crate::execute::RunError;
use hoist_core::{Job, Project, Settings};
use std::path::{Path, PathBuf};

/// Everything needed to spawn one job process.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Argument vector as recorded on the job for auditability.
    pub fn display_args(&self) -> Vec<String> {
        vec![self.program.display().to_string(), self.args.join(" ")]
    }

    /// Environment as recorded on the job. Secret values never enter the
    /// environment, so entries are recorded verbatim.
    pub fn display_env(&self) -> Vec<String> {
        self.env.iter().map(|(key, value)| format!("{key}={value}")).collect()
    }
}

/// Build the playbook-runner invocation for an update job.
///
/// The argument vector is a pure function of the job's playbook and its
/// JSON-encoded extra vars; `agent` supplies the ssh-agent socket and pid
/// when the job authenticates with a key.
pub fn build_update_command(
    job: &Job,
    project: &Project,
    settings: &Settings,
    agent: Option<(&Path, u32)>,
) -> Result<CommandSpec, RunError> {
    let vars = serde_json::to_string(&job.extra_vars)
        .map_err(|err| RunError::CommandBuildFailed(format!("extra vars: {err}")))?;

    let args = vec![
        "-i".to_string(),
        "localhost,".to_string(),
        "-v".to_string(),
        "-e".to_string(),
        vars,
        job.playbook.clone(),
    ];

    let project_path = project.local_path(&settings.projects_home);
    let project_path_display = project_path.display().to_string();
    let home_path = format!("{}/", settings.projects_home.display());

    let mut env: Vec<(String, String)> = vec![
        ("TERM".to_string(), "xterm".to_string()),
        ("PROJECT_PATH".to_string(), project_path_display.clone()),
        ("HOME_PATH".to_string(), home_path),
        ("PWD".to_string(), project_path_display),
        ("SHLVL".to_string(), "1".to_string()),
        ("HOME".to_string(), std::env::var("HOME").unwrap_or_default()),
        ("_".to_string(), "/usr/bin/hoistd".to_string()),
        (
            "PATH".to_string(),
            "/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
        ),
        ("ANSIBLE_PARAMIKO_RECORD_HOST_KEYS".to_string(), "False".to_string()),
        ("ANSIBLE_HOST_KEY_CHECKING".to_string(), "False".to_string()),
        ("JOB_ID".to_string(), job.id.as_str().to_string()),
        ("ANSIBLE_FORCE_COLOR".to_string(), "True".to_string()),
    ];
    if let Some((socket, pid)) = agent {
        env.push(("SSH_AUTH_SOCK".to_string(), socket.display().to_string()));
        env.push(("SSH_AGENT_PID".to_string(), pid.to_string()));
    }

    Ok(CommandSpec { program: settings.playbook_command.clone(), args, env, cwd: project_path })
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
