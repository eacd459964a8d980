// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context: the unit placed on the job queue.
//!
//! Bundles the job, the project it operates on, and the still-encrypted
//! credential record (when the project has one). Secret material is only
//! decrypted by the worker, inside one execution attempt; the serialized
//! form never contains plaintext secrets.

use crate::credential::Credential;
use crate::job::Job;
use crate::project::Project;
use serde::{Deserialize, Serialize};

/// Errors encoding or decoding a queue payload.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to encode execution context")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode execution context")]
    Decode(#[source] serde_json::Error),
}

/// Snapshot handed to a worker for one execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub job: Job,
    pub project: Project,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

impl ExecutionContext {
    /// Serialize for queue publication.
    pub fn encode(&self) -> Result<Vec<u8>, ContextError> {
        serde_json::to_vec(self).map_err(ContextError::Encode)
    }

    /// Deserialize a consumed queue payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, ContextError> {
        serde_json::from_slice(bytes).map_err(ContextError::Decode)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
