// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefixed identifier newtypes.

/// Define a newtype ID wrapper around `SmolStr` with a type prefix.
///
/// The generated format is `{prefix}{nanoid}`: a short type indicator
/// followed by a 19 character random suffix, which keeps the whole ID
/// within `SmolStr`'s inline capacity.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix.
            pub fn generate() -> Self {
                Self(smol_str::SmolStr::new(format!("{}{}", $prefix, nanoid::nanoid!(19))))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }
    };
}

define_id! {
    /// Unique identifier for a job. Immutable once created.
    pub struct JobId("job-");
}

define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId("prj-");
}

define_id! {
    /// Unique identifier for a stored credential.
    pub struct CredentialId("crd-");
}

define_id! {
    /// Unique identifier for a user (created-by / modified-by references).
    pub struct UserId("usr-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
