// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn encrypted_credential(cipher: &SecretCipher) -> Credential {
    Credential {
        id: CredentialId::from("crd-deploy"),
        name: "deploy key".to_string(),
        ssh_key_data: Some(cipher.encrypt(b"key bytes").unwrap()),
        ssh_key_unlock: Some(cipher.encrypt(b"unlock me").unwrap()),
        password: Some(cipher.encrypt(b"hunter2").unwrap()),
    }
}

#[test]
fn resolve_returns_stored_record() {
    let store = Arc::new(MemoryCredentialStore::new());
    let cipher = SecretCipher::generate();
    store.insert(encrypted_credential(&cipher));
    let vault = Vault::new(store, cipher);

    let credential = vault.resolve(&CredentialId::from("crd-deploy")).unwrap();
    assert_eq!(credential.name, "deploy key");
    assert!(credential.has_ssh_key());
}

#[test]
fn resolve_missing_credential_fails() {
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), SecretCipher::generate());

    let err = vault.resolve(&CredentialId::from("crd-absent")).unwrap_err();
    assert!(matches!(err, VaultError::CredentialNotFound(_)));
    assert!(err.to_string().contains("crd-absent"));
}

#[test]
fn decrypt_recovers_all_fields() {
    let cipher = SecretCipher::generate();
    let credential = encrypted_credential(&cipher);
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), cipher);

    let material = vault.decrypt(&credential).unwrap();
    assert_eq!(material.ssh_key.as_deref(), Some(b"key bytes".as_slice()));
    assert_eq!(material.ssh_key_unlock.as_deref(), Some("unlock me"));
    assert_eq!(material.password.as_deref(), Some("hunter2"));
}

#[test]
fn decrypt_with_mismatched_key_names_the_field() {
    let credential = encrypted_credential(&SecretCipher::generate());
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), SecretCipher::generate());

    let err = vault.decrypt(&credential).unwrap_err();
    assert!(matches!(err, VaultError::DecryptionFailed { field: "ssh_key_data", .. }));
}

#[test]
fn decrypt_skips_absent_fields() {
    let cipher = SecretCipher::generate();
    let credential = Credential {
        id: CredentialId::from("crd-pw"),
        name: "password only".to_string(),
        ssh_key_data: None,
        ssh_key_unlock: None,
        password: Some(cipher.encrypt(b"hunter2").unwrap()),
    };
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), cipher);

    let material = vault.decrypt(&credential).unwrap();
    assert!(!material.has_ssh_key());
    assert_eq!(material.password.as_deref(), Some("hunter2"));
}

#[test]
fn secret_material_debug_is_redacted() {
    let cipher = SecretCipher::generate();
    let credential = encrypted_credential(&cipher);
    let vault = Vault::new(Arc::new(MemoryCredentialStore::new()), cipher);

    let rendered = format!("{:?}", vault.decrypt(&credential).unwrap());
    assert!(rendered.contains("[redacted]"));
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("unlock me"));
}

#[test]
fn fs_store_round_trips_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsCredentialStore::open(dir.path()).unwrap();
    let cipher = SecretCipher::generate();
    let credential = encrypted_credential(&cipher);

    let path = dir.path().join(format!("{}.json", credential.id.as_str()));
    std::fs::write(&path, serde_json::to_vec(&credential).unwrap()).unwrap();

    let fetched = store.fetch(&credential.id).unwrap().unwrap();
    assert_eq!(fetched.name, credential.name);
    assert_eq!(fetched.ssh_key_data, credential.ssh_key_data);

    assert!(store.fetch(&CredentialId::from("crd-missing")).unwrap().is_none());
}
