// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool consuming the job queue.

use crate::executor::JobExecutor;
use crate::queue::JobQueue;
use hoist_core::{Clock, ExecutionContext, SystemClock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Maintains N independent workers, each running one job end-to-end at a
/// time. A job's failure never terminates its worker or affects others.
pub struct Dispatcher<C: Clock = SystemClock> {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor<C>>,
    workers: usize,
}

impl<C: Clock + 'static> Dispatcher<C> {
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor<C>>, workers: usize) -> Self {
        Self { queue, executor, workers: workers.max(1) }
    }

    /// Run the pool until `shutdown` is cancelled. Workers finish their
    /// in-flight job before exiting.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(workers = self.workers, "dispatcher started");
        let mut handles = Vec::with_capacity(self.workers);
        for slot in 0..self.workers {
            let queue = self.queue.clone();
            let executor = self.executor.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(worker_loop(slot, queue, executor, shutdown)));
        }
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!(%err, "worker task aborted");
            }
        }
        tracing::info!("dispatcher stopped");
    }
}

async fn worker_loop<C: Clock>(
    slot: usize,
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor<C>>,
    shutdown: CancellationToken,
) {
    loop {
        let delivery = tokio::select! {
            _ = shutdown.cancelled() => break,
            delivery = queue.consume() => delivery,
        };

        match ExecutionContext::decode(&delivery.payload) {
            Ok(ctx) => {
                tracing::debug!(worker = slot, job = %ctx.job.id, "worker took job");
                executor.execute(ctx).await;
            }
            // Undecodable payloads are acked below so they don't wedge the queue
            Err(err) => tracing::error!(worker = slot, %err, "dropping undecodable queue item"),
        }

        if let Err(err) = queue.ack(&delivery.item_id) {
            tracing::warn!(worker = slot, item = %delivery.item_id, %err, "failed to ack item");
        }
    }
    tracing::debug!(worker = slot, "worker stopped");
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
