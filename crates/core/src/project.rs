// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project reference data.
//!
//! The execution pipeline only reads projects; mutations (last-job fields
//! and friends) belong to the CRUD layer outside this core.

use crate::id::{CredentialId, ProjectId, UserId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source-control system backing a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScmType {
    Git,
    Hg,
}

impl std::fmt::Display for ScmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScmType::Git => "git",
            ScmType::Hg => "hg",
        })
    }
}

/// A project whose source checkout update jobs operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub scm_type: ScmType,
    pub scm_url: String,
    /// Branch to check out; empty means HEAD at job-build time
    #[serde(default)]
    pub scm_branch: String,
    /// Discard local modifications before updating
    #[serde(default)]
    pub scm_clean: bool,
    /// Remove the checkout entirely before updating
    #[serde(default)]
    pub scm_delete_on_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_credential_id: Option<CredentialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<UserId>,
}

impl Project {
    /// Fixed local storage path for this project's checkout.
    pub fn local_path(&self, projects_home: &Path) -> PathBuf {
        projects_home.join(self.id.as_str())
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
pub(crate) mod tests;
