// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Private key parsing and passphrase unlock.

use crate::session::AgentError;
use ssh_key::PrivateKey;

/// Parse an OpenSSH private key, decrypting it first when it is
/// passphrase-protected.
///
/// A wrong passphrase, a missing passphrase for an encrypted key, or a
/// malformed key all fail fast with [`AgentError::KeyDecryptFailed`];
/// there is no fallback to other authentication methods.
pub(crate) fn unlock_key(
    key_bytes: &[u8],
    passphrase: Option<&str>,
) -> Result<PrivateKey, AgentError> {
    let key = PrivateKey::from_openssh(key_bytes)
        .map_err(|err| AgentError::KeyDecryptFailed(err.to_string()))?;

    if !key.is_encrypted() {
        return Ok(key);
    }

    let passphrase = passphrase.ok_or_else(|| {
        AgentError::KeyDecryptFailed("key is encrypted and no unlock passphrase was given".into())
    })?;
    key.decrypt(passphrase).map_err(|err| AgentError::KeyDecryptFailed(err.to_string()))
}

#[cfg(test)]
#[path = "key_tests.rs"]
pub(crate) mod tests;
