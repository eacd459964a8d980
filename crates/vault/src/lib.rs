// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential vault: symmetric encryption of secret material at rest and
//! scoped decryption for the duration of one job execution.

mod cipher;
mod vault;

pub use cipher::{CipherError, SecretCipher};
pub use vault::{
    CredentialStore, FsCredentialStore, MemoryCredentialStore, SecretMaterial, Vault, VaultError,
};
