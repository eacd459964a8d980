// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::{JobStore, MemoryJobStore};
use crate::test_support::{test_job_with, test_project, test_settings, write_stub};
use hoist_core::{FakeClock, Job, JobStatus};
use hoist_vault::{MemoryCredentialStore, SecretCipher, Vault};
use std::time::Duration;

struct Pool {
    queue: Arc<JobQueue>,
    store: Arc<MemoryJobStore>,
    dispatcher: Dispatcher<FakeClock>,
}

fn pool(state_dir: &std::path::Path, stub_body: &str, workers: usize) -> Pool {
    let queue = Arc::new(JobQueue::open(&state_dir.join("queue.journal")).unwrap());
    let store = Arc::new(MemoryJobStore::new());
    let stub = write_stub(state_dir, stub_body);
    let settings = test_settings(state_dir, stub);
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), SecretCipher::generate());
    let executor =
        Arc::new(JobExecutor::new(store.clone(), vault, settings, FakeClock::new()));
    let dispatcher = Dispatcher::new(queue.clone(), executor, workers);
    Pool { queue, store, dispatcher }
}

fn publish_job(queue: &JobQueue, job: &Job) {
    let ctx = ExecutionContext { job: job.clone(), project: test_project(), credential: None };
    queue.publish(&ctx.encode().unwrap()).unwrap();
}

async fn wait_terminal(store: &MemoryJobStore, jobs: &[Job]) -> bool {
    for _ in 0..200 {
        let all_done = jobs.iter().all(|job| {
            store
                .load(&job.id)
                .ok()
                .flatten()
                .map(|stored| stored.is_terminal())
                .unwrap_or(false)
        });
        if all_done {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_drains_multiple_jobs_to_terminal_states() {
    let dir = tempfile::tempdir().unwrap();
    let Pool { queue, store, dispatcher } = pool(dir.path(), "echo done", 2);

    let jobs: Vec<Job> = (0..4).map(|i| test_job_with(|c| c.name = format!("job {i}"))).collect();
    for job in &jobs {
        publish_job(&queue, job);
    }

    let shutdown = CancellationToken::new();
    let runner = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    assert!(wait_terminal(&store, &jobs).await, "jobs did not finish");
    for job in &jobs {
        let stored = store.load(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Succeeded);
    }
    assert_eq!(queue.pending_len(), 0);

    shutdown.cancel();
    runner.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn undecodable_payload_does_not_kill_the_worker() {
    let dir = tempfile::tempdir().unwrap();
    let Pool { queue, store, dispatcher } = pool(dir.path(), "echo done", 1);

    queue.publish(b"garbage payload").unwrap();
    let job = test_job_with(|_| {});
    publish_job(&queue, &job);

    let shutdown = CancellationToken::new();
    let runner = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    // The worker must survive the garbage item and execute the real job
    assert!(wait_terminal(&store, std::slice::from_ref(&job)).await);
    assert_eq!(store.load(&job.id).unwrap().unwrap().status, JobStatus::Succeeded);

    shutdown.cancel();
    runner.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_failing_job_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    // Fail when the extra vars mention the failing branch
    let Pool { queue, store, dispatcher } =
        pool(dir.path(), "case \"$*\" in *bad-branch*) exit 1;; esac; echo ok", 2);

    let good = test_job_with(|_| {});
    let bad = test_job_with(|c| {
        c.extra_vars.insert("scm_branch".to_string(), serde_json::json!("bad-branch"));
    });
    publish_job(&queue, &good);
    publish_job(&queue, &bad);

    let shutdown = CancellationToken::new();
    let runner = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    assert!(wait_terminal(&store, &[good.clone(), bad.clone()]).await);
    assert_eq!(store.load(&good.id).unwrap().unwrap().status, JobStatus::Succeeded);
    assert_eq!(store.load(&bad.id).unwrap().unwrap().status, JobStatus::Failed);

    shutdown.cancel();
    runner.await.unwrap();
}
