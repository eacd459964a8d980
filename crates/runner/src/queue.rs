// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable job queue with at-least-once delivery.
//!
//! Every mutation appends a record to a JSONL journal before it is
//! applied in memory. On open, the journal is replayed: items pushed but
//! never completed — including items taken by a worker that crashed
//! before acking — come back as pending, so consumers must be idempotent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tokio::sync::Notify;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job queue unavailable")]
    Unavailable(#[source] std::io::Error),
    #[error("corrupt queue journal at line {line}")]
    CorruptJournal {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("corrupt queue journal at line {line}: bad payload encoding")]
    CorruptPayload { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStatus {
    Pending,
    Active,
}

struct QueueItem {
    id: String,
    payload: Vec<u8>,
    status: ItemStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JournalRecord {
    Pushed { id: String, payload: String },
    Taken { id: String },
    Completed { id: String },
}

/// One consumed queue item. Ack with [`JobQueue::ack`] after processing.
pub struct Delivery {
    pub item_id: String,
    pub payload: Vec<u8>,
}

/// Durable channel between job producers and the worker pool.
pub struct JobQueue {
    items: Mutex<Vec<QueueItem>>,
    journal: Mutex<std::fs::File>,
    notify: Notify,
}

impl JobQueue {
    /// Open (or create) a queue backed by the journal at `path`,
    /// re-materializing undelivered items.
    pub fn open(path: &Path) -> Result<Self, QueueError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(QueueError::Unavailable)?;
        }

        let mut items: Vec<QueueItem> = Vec::new();
        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(QueueError::Unavailable)?;
            for (index, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let line_no = index + 1;
                let record: JournalRecord = serde_json::from_str(line)
                    .map_err(|source| QueueError::CorruptJournal { line: line_no, source })?;
                match record {
                    JournalRecord::Pushed { id, payload } => {
                        let payload = BASE64
                            .decode(payload)
                            .map_err(|_| QueueError::CorruptPayload { line: line_no })?;
                        // Idempotency: skip if the item already exists
                        if !items.iter().any(|item| item.id == id) {
                            items.push(QueueItem { id, payload, status: ItemStatus::Pending });
                        }
                    }
                    JournalRecord::Taken { id } => {
                        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
                            item.status = ItemStatus::Active;
                        }
                    }
                    JournalRecord::Completed { id } => {
                        items.retain(|item| item.id != id);
                    }
                }
            }
            // At-least-once: anything taken but never completed is redelivered
            for item in &mut items {
                if item.status == ItemStatus::Active {
                    tracing::info!(item = %item.id, "requeueing undelivered item");
                    item.status = ItemStatus::Pending;
                }
            }
        }

        let journal = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(QueueError::Unavailable)?;

        Ok(Self { items: Mutex::new(items), journal: Mutex::new(journal), notify: Notify::new() })
    }

    fn append(&self, record: &JournalRecord) -> Result<(), QueueError> {
        let line = serde_json::to_string(record).map_err(|err| {
            QueueError::Unavailable(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?;
        let mut journal = self.journal.lock();
        writeln!(journal, "{line}").map_err(QueueError::Unavailable)?;
        journal.flush().map_err(QueueError::Unavailable)?;
        Ok(())
    }

    /// Enqueue an opaque payload. Publishing is what commits a job to
    /// "will run"; a failure here surfaces synchronously to the producer.
    pub fn publish(&self, payload: &[u8]) -> Result<String, QueueError> {
        let id = format!("itm-{}", nanoid::nanoid!(12));
        self.append(&JournalRecord::Pushed { id: id.clone(), payload: BASE64.encode(payload) })?;
        self.items.lock().push(QueueItem {
            id: id.clone(),
            payload: payload.to_vec(),
            status: ItemStatus::Pending,
        });
        self.notify.notify_one();
        Ok(id)
    }

    /// Block until an item is available; it is handed to exactly one
    /// consumer and stays in the journal until acked.
    pub async fn consume(&self) -> Delivery {
        loop {
            if let Some(delivery) = self.take_pending() {
                if let Err(err) = self.append(&JournalRecord::Taken { id: delivery.item_id.clone() })
                {
                    tracing::warn!(item = %delivery.item_id, %err, "failed to journal queue take");
                }
                return delivery;
            }
            self.notify.notified().await;
        }
    }

    fn take_pending(&self) -> Option<Delivery> {
        let mut items = self.items.lock();
        let item = items.iter_mut().find(|item| item.status == ItemStatus::Pending)?;
        item.status = ItemStatus::Active;
        Some(Delivery { item_id: item.id.clone(), payload: item.payload.clone() })
    }

    /// Mark an item processed; it will never be redelivered.
    pub fn ack(&self, item_id: &str) -> Result<(), QueueError> {
        self.append(&JournalRecord::Completed { id: item_id.to_string() })?;
        self.items.lock().retain(|item| item.id != item_id);
        Ok(())
    }

    /// Number of items awaiting delivery.
    pub fn pending_len(&self) -> usize {
        self.items.lock().iter().filter(|item| item.status == ItemStatus::Pending).count()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
