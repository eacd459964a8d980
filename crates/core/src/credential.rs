// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At-rest credential records.
//!
//! Every populated secret field holds a base64 `nonce || ciphertext`
//! payload produced by the vault's secret cipher; this core never sees or
//! stores the fields in cleartext outside one job execution.

use crate::id::CredentialId;
use serde::{Deserialize, Serialize};

/// Secret material associated with a project's SCM access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub name: String,
    /// Encrypted OpenSSH private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_data: Option<String>,
    /// Encrypted passphrase unlocking `ssh_key_data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_unlock: Option<String>,
    /// Encrypted password for interactive prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credential {
    pub fn has_ssh_key(&self) -> bool {
        self.ssh_key_data.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}
