// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::MemoryJobStore;
use crate::test_support::test_project;
use hoist_core::{Credential, CredentialId, FakeClock, JobStatus};
use hoist_vault::{MemoryCredentialStore, SecretCipher};
use std::sync::Arc;

struct Fixture {
    store: MemoryJobStore,
    queue: JobQueue,
    vault: Vault,
    credentials: Arc<MemoryCredentialStore>,
    settings: Settings,
    clock: FakeClock,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let queue = JobQueue::open(&dir.path().join("queue.journal")).unwrap();
    let credentials = Arc::new(MemoryCredentialStore::new());
    let vault = Vault::new(credentials.clone(), SecretCipher::generate());
    let settings = Settings::new(dir.path());
    Fixture {
        store: MemoryJobStore::new(),
        queue,
        vault,
        credentials,
        settings,
        clock: FakeClock::new(),
        _dir: dir,
    }
}

#[test]
fn update_job_is_persisted_pending_and_published() {
    let f = fixture();
    let project = test_project();

    let job = update_project(
        &project,
        None,
        &f.store,
        &f.vault,
        &f.queue,
        &f.settings,
        &f.clock,
    )
    .unwrap();

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.kind, JobKind::Update);
    assert_eq!(job.playbook, UPDATE_PLAYBOOK);
    assert_eq!(job.name, "demo update job");
    assert!(f.store.load(&job.id).unwrap().is_some());
    assert_eq!(f.queue.pending_len(), 1);
}

#[test]
fn extra_vars_describe_the_checkout() {
    let f = fixture();
    let mut project = test_project();
    project.scm_branch = "release-1.2".to_string();
    project.scm_clean = true;

    let job = update_project(
        &project,
        None,
        &f.store,
        &f.vault,
        &f.queue,
        &f.settings,
        &f.clock,
    )
    .unwrap();

    assert_eq!(job.extra_vars["scm_branch"], serde_json::json!("release-1.2"));
    assert_eq!(job.extra_vars["scm_type"], serde_json::json!("git"));
    assert_eq!(job.extra_vars["scm_clean"], serde_json::json!(true));
    assert_eq!(job.extra_vars["scm_url"], serde_json::json!("git@example.com:demo/demo.git"));
    assert_eq!(job.extra_vars["scm_accept_hostkey"], serde_json::json!(true));
    assert!(job.extra_vars["project_path"]
        .as_str()
        .is_some_and(|path| path.ends_with("projects/prj-demo")));
}

#[test]
fn empty_branch_defaults_to_head() {
    let f = fixture();
    let project = test_project();

    let job = update_project(
        &project,
        None,
        &f.store,
        &f.vault,
        &f.queue,
        &f.settings,
        &f.clock,
    )
    .unwrap();

    assert_eq!(job.extra_vars["scm_branch"], serde_json::json!("HEAD"));
}

#[test]
fn referenced_credential_is_embedded_encrypted() {
    let f = fixture();
    let payload = f.vault.cipher().encrypt(b"key bytes").unwrap();
    f.credentials.insert(Credential {
        id: CredentialId::from("crd-scm"),
        name: "scm".to_string(),
        ssh_key_data: Some(payload.clone()),
        ssh_key_unlock: None,
        password: None,
    });
    let mut project = test_project();
    project.scm_credential_id = Some(CredentialId::from("crd-scm"));

    update_project(&project, None, &f.store, &f.vault, &f.queue, &f.settings, &f.clock)
        .unwrap();

    let delivery = futures_block_on(f.queue.consume());
    let ctx = ExecutionContext::decode(&delivery.payload).unwrap();
    let credential = ctx.credential.unwrap();
    // Still ciphertext in the queue payload
    assert_eq!(credential.ssh_key_data.as_deref(), Some(payload.as_str()));
}

#[test]
fn missing_credential_fails_and_leaves_job_pending() {
    let f = fixture();
    let mut project = test_project();
    project.scm_credential_id = Some(CredentialId::from("crd-ghost"));

    let err = update_project(
        &project,
        None,
        &f.store,
        &f.vault,
        &f.queue,
        &f.settings,
        &f.clock,
    )
    .unwrap_err();

    assert!(matches!(err, ProduceError::Credential(VaultError::CredentialNotFound(_))));
    // Nothing was published, but the pending record is detectable
    assert_eq!(f.queue.pending_len(), 0);
    let ids = f.store.list_ids().unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(f.store.load(&ids[0]).unwrap().unwrap().status, JobStatus::Pending);
}

/// Minimal block_on for the one consume call in this sync test module.
fn futures_block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}
