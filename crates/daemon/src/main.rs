// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hoistd — the hoist job execution daemon.
//!
//! Opens the durable state (queue journal, job and credential records,
//! cipher key), then runs the dispatcher worker pool until SIGINT.

mod env;

use anyhow::Context;
use clap::Parser;
use fs2::FileExt;
use hoist_core::SystemClock;
use hoist_runner::{Dispatcher, FsJobStore, JobExecutor, JobQueue};
use hoist_vault::{FsCredentialStore, Vault};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hoistd", version, about = "Automation job execution daemon")]
struct Args {
    /// State directory (default: HOIST_STATE_DIR or ~/.local/state/hoist)
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Number of concurrent workers (default: HOIST_WORKERS or 2)
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HOIST_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = env::resolve_settings(args.state_dir, args.workers)?;
    std::fs::create_dir_all(&settings.state_dir)
        .with_context(|| format!("creating {}", settings.state_dir.display()))?;

    // One daemon per state directory. Open without truncating so a losing
    // contender cannot wipe the running daemon's pid.
    let lock_path = settings.state_dir.join("hoistd.lock");
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("opening {}", lock_path.display()))?;
    lock_file
        .try_lock_exclusive()
        .with_context(|| format!("another hoistd owns {}", settings.state_dir.display()))?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let cipher = env::secret_cipher(&settings)?;
    let store = Arc::new(FsJobStore::open(settings.jobs_dir())?);
    let credentials = Arc::new(FsCredentialStore::open(settings.credentials_dir())?);
    let vault = Vault::new(credentials, cipher);
    let queue = Arc::new(JobQueue::open(&settings.queue_journal_path())?);
    let executor = Arc::new(JobExecutor::new(store, vault, settings.clone(), SystemClock));
    let dispatcher = Dispatcher::new(queue, executor, settings.workers);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutdown signal received"),
                Err(err) => tracing::error!(%err, "failed to listen for shutdown signal"),
            }
            shutdown.cancel();
        });
    }

    tracing::info!(
        state_dir = %settings.state_dir.display(),
        workers = settings.workers,
        "hoistd started"
    );
    dispatcher.run(shutdown).await;
    Ok(())
}
