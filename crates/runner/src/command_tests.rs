// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{test_job, test_job_with, test_project};
use hoist_core::Settings;
use std::collections::BTreeMap;

fn settings() -> Settings {
    Settings::new("/var/lib/hoist")
}

#[test]
fn argument_vector_is_deterministic() {
    let mut extra_vars = BTreeMap::new();
    extra_vars.insert("scm_branch".to_string(), serde_json::json!("main"));
    extra_vars.insert("scm_clean".to_string(), serde_json::json!(true));
    let job = test_job_with(|config| config.extra_vars = extra_vars.clone());

    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    assert_eq!(
        spec.args,
        vec![
            "-i",
            "localhost,",
            "-v",
            "-e",
            "{\"scm_branch\":\"main\",\"scm_clean\":true}",
            "project_update.yml",
        ]
    );
}

#[test]
fn cwd_is_the_project_local_path() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();
    assert_eq!(spec.cwd, PathBuf::from("/var/lib/hoist/projects/prj-demo"));
}

#[test]
fn environment_has_the_exact_key_set() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    let keys: Vec<&str> = spec.env.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "TERM",
            "PROJECT_PATH",
            "HOME_PATH",
            "PWD",
            "SHLVL",
            "HOME",
            "_",
            "PATH",
            "ANSIBLE_PARAMIKO_RECORD_HOST_KEYS",
            "ANSIBLE_HOST_KEY_CHECKING",
            "JOB_ID",
            "ANSIBLE_FORCE_COLOR",
        ]
    );
}

#[test]
fn agent_endpoint_lands_in_the_environment() {
    let job = test_job();
    let spec = build_update_command(
        &job,
        &test_project(),
        &settings(),
        Some((Path::new("/tmp/agent-x.sock"), 4321)),
    )
    .unwrap();

    let env: BTreeMap<&str, &str> =
        spec.env.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();
    assert_eq!(env.get("SSH_AUTH_SOCK"), Some(&"/tmp/agent-x.sock"));
    assert_eq!(env.get("SSH_AGENT_PID"), Some(&"4321"));
}

#[test]
fn no_agent_means_no_agent_environment() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    assert!(!spec.env.iter().any(|(key, _)| key == "SSH_AUTH_SOCK" || key == "SSH_AGENT_PID"));
}

#[test]
fn host_key_prompts_are_disabled() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    let env: BTreeMap<&str, &str> =
        spec.env.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();
    assert_eq!(env.get("ANSIBLE_HOST_KEY_CHECKING"), Some(&"False"));
    assert_eq!(env.get("ANSIBLE_PARAMIKO_RECORD_HOST_KEYS"), Some(&"False"));
}

#[test]
fn display_args_record_program_and_joined_arguments() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    let display = spec.display_args();
    assert_eq!(display.len(), 2);
    assert_eq!(display[0], "ansible-playbook");
    assert!(display[1].starts_with("-i localhost, -v -e"));
    assert!(display[1].ends_with("project_update.yml"));
}

#[test]
fn display_env_formats_key_value_pairs() {
    let job = test_job();
    let spec = build_update_command(&job, &test_project(), &settings(), None).unwrap();

    let env = spec.display_env();
    assert!(env.contains(&"TERM=xterm".to_string()));
    assert!(env.iter().any(|entry| entry.starts_with("JOB_ID=job-")));
}
