// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generated_ids_carry_type_prefix() {
    assert!(JobId::generate().as_str().starts_with("job-"));
    assert!(ProjectId::generate().as_str().starts_with("prj-"));
    assert!(CredentialId::generate().as_str().starts_with("crd-"));
    assert!(UserId::generate().as_str().starts_with("usr-"));
}

#[test]
fn generated_ids_are_unique() {
    let a = JobId::generate();
    let b = JobId::generate();
    assert_ne!(a, b);
}

#[test]
fn id_display_matches_as_str() {
    let id = JobId::from("job-abc");
    assert_eq!(id.to_string(), "job-abc");
    assert_eq!(id.as_str(), "job-abc");
}

#[test]
fn id_serde_is_transparent() {
    let id = JobId::from("job-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"job-xyz\"");

    let parsed: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}
