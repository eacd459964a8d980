// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for runner tests.

use hoist_core::{
    FakeClock, Job, JobConfig, JobKind, LaunchType, Project, ProjectId, ScmType, Settings,
};
use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) fn test_job_config() -> JobConfig {
    JobConfig {
        name: "demo update job".to_string(),
        description: "updates the demo project checkout".to_string(),
        launch_type: LaunchType::Manual,
        kind: JobKind::Update,
        playbook: "project_update.yml".to_string(),
        verbosity: 0,
        project_id: ProjectId::from("prj-demo"),
        credential_id: None,
        extra_vars: BTreeMap::new(),
        created_by: None,
    }
}

pub(crate) fn test_job() -> Job {
    Job::new(test_job_config(), &FakeClock::new())
}

pub(crate) fn test_job_with(mutate: impl FnOnce(&mut JobConfig)) -> Job {
    let mut config = test_job_config();
    mutate(&mut config);
    Job::new(config, &FakeClock::new())
}

pub(crate) fn test_project() -> Project {
    Project {
        id: ProjectId::from("prj-demo"),
        name: "demo".to_string(),
        scm_type: ScmType::Git,
        scm_url: "git@example.com:demo/demo.git".to_string(),
        scm_branch: String::new(),
        scm_clean: false,
        scm_delete_on_update: false,
        scm_credential_id: None,
        created_by: None,
        modified_by: None,
    }
}

/// Write an executable stub standing in for the playbook runner.
pub(crate) fn write_stub(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("playbook-stub.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Settings rooted in a temp dir, pointing at a stub runner with a short
/// timeout.
pub(crate) fn test_settings(state_dir: &Path, stub: PathBuf) -> Settings {
    let mut settings = Settings::new(state_dir);
    settings.playbook_command = stub;
    settings.job_timeout = Duration::from_secs(5);
    settings
}
