// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution and scoped decryption.
//!
//! `resolve` fetches the at-rest record (producers embed it in the
//! execution context); `decrypt` turns a record into [`SecretMaterial`]
//! on the worker side. Decrypted material lives on the caller's stack for
//! one execution and is never logged or persisted.

use crate::cipher::{CipherError, SecretCipher};
use hoist_core::{Credential, CredentialId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("credential {0} not found")]
    CredentialNotFound(CredentialId),
    #[error("failed to decrypt credential field `{field}`")]
    DecryptionFailed {
        field: &'static str,
        #[source]
        source: CipherError,
    },
    #[error("credential backend error")]
    Backend(#[source] std::io::Error),
}

/// Read-only collaborator contract with credential storage.
pub trait CredentialStore: Send + Sync {
    fn fetch(&self, id: &CredentialId) -> Result<Option<Credential>, std::io::Error>;
}

/// Decrypted secret material, scoped to one job execution.
///
/// `Debug` deliberately reports only which fields are present.
pub struct SecretMaterial {
    pub ssh_key: Option<Vec<u8>>,
    pub ssh_key_unlock: Option<String>,
    pub password: Option<String>,
}

impl SecretMaterial {
    pub fn has_ssh_key(&self) -> bool {
        self.ssh_key.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

impl std::fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("ssh_key", &self.ssh_key.as_ref().map(|_| "[redacted]"))
            .field("ssh_key_unlock", &self.ssh_key_unlock.as_ref().map(|_| "[redacted]"))
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Fetches credential records and decrypts their fields.
#[derive(Clone)]
pub struct Vault {
    store: Arc<dyn CredentialStore>,
    cipher: SecretCipher,
}

impl Vault {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: SecretCipher) -> Self {
        Self { store, cipher }
    }

    /// Fetch the at-rest record for a credential id.
    pub fn resolve(&self, id: &CredentialId) -> Result<Credential, VaultError> {
        match self.store.fetch(id).map_err(VaultError::Backend)? {
            Some(credential) => Ok(credential),
            None => Err(VaultError::CredentialNotFound(id.clone())),
        }
    }

    /// Decrypt every populated field of a record.
    pub fn decrypt(&self, credential: &Credential) -> Result<SecretMaterial, VaultError> {
        let ssh_key = credential
            .ssh_key_data
            .as_deref()
            .map(|payload| self.cipher.decrypt(payload))
            .transpose()
            .map_err(|source| VaultError::DecryptionFailed { field: "ssh_key_data", source })?;
        let ssh_key_unlock = credential
            .ssh_key_unlock
            .as_deref()
            .map(|payload| self.cipher.decrypt_string(payload))
            .transpose()
            .map_err(|source| VaultError::DecryptionFailed { field: "ssh_key_unlock", source })?;
        let password = credential
            .password
            .as_deref()
            .map(|payload| self.cipher.decrypt_string(payload))
            .transpose()
            .map_err(|source| VaultError::DecryptionFailed { field: "password", source })?;

        Ok(SecretMaterial { ssh_key, ssh_key_unlock, password })
    }

    pub fn cipher(&self) -> &SecretCipher {
        &self.cipher
    }
}

/// In-memory credential store for tests and embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<CredentialId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, credential: Credential) {
        self.records.lock().insert(credential.id.clone(), credential);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn fetch(&self, id: &CredentialId) -> Result<Option<Credential>, std::io::Error> {
        Ok(self.records.lock().get(id).cloned())
    }
}

/// Credential records as JSON files under a directory.
pub struct FsCredentialStore {
    dir: PathBuf,
}

impl FsCredentialStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &CredentialId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl CredentialStore for FsCredentialStore {
    fn fetch(&self, id: &CredentialId) -> Result<Option<Credential>, std::io::Error> {
        let path = self.record_path(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let credential = serde_json::from_str(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        Ok(Some(credential))
    }
}

#[cfg(test)]
#[path = "vault_tests.rs"]
mod tests;
