// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symmetric cipher for credential fields at rest.
//!
//! AES-256-GCM with a random 96-bit nonce per field; payloads are encoded
//! as base64 of `nonce || ciphertext`. The authentication tag guarantees
//! a mismatched key fails cleanly instead of yielding corrupted plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("cipher key must be {KEY_LEN} bytes of base64")]
    InvalidKey,
    #[error("failed to encrypt secret field")]
    EncryptionFailed,
    #[error("failed to decrypt secret field")]
    DecryptionFailed,
}

/// Encrypts and decrypts individual secret fields.
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_LEN],
}

impl SecretCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Generate a cipher with a fresh random key.
    pub fn generate() -> Self {
        Self { key: rand::random() }
    }

    /// Parse a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|_| CipherError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CipherError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// The key, base64-encoded, for persisting to the key file.
    pub fn key_base64(&self) -> String {
        BASE64.encode(self.key)
    }

    /// Encrypt a plaintext field into a base64 payload.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::InvalidKey)?;
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext =
            cipher.encrypt(nonce, plaintext).map_err(|_| CipherError::EncryptionFailed)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Decrypt a base64 payload produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, payload: &str) -> Result<Vec<u8>, CipherError> {
        let bytes = BASE64.decode(payload).map_err(|_| CipherError::DecryptionFailed)?;
        if bytes.len() < NONCE_LEN {
            return Err(CipherError::DecryptionFailed);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::InvalidKey)?;
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }

    /// Decrypt a payload that must be UTF-8 (passphrases, passwords).
    pub fn decrypt_string(&self, payload: &str) -> Result<String, CipherError> {
        String::from_utf8(self.decrypt(payload)?).map_err(|_| CipherError::DecryptionFailed)
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretCipher([redacted])")
    }
}

#[cfg(test)]
#[path = "cipher_tests.rs"]
mod tests;
