// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use anyhow::Context;
use hoist_core::Settings;
use hoist_vault::SecretCipher;
use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: HOIST_STATE_DIR > XDG_STATE_HOME/hoist >
/// ~/.local/state/hoist
pub fn state_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("HOIST_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("hoist"));
    }
    let home = dirs::home_dir().context("cannot determine home directory for state dir")?;
    Ok(home.join(".local/state/hoist"))
}

/// Build settings from flags and environment.
pub fn resolve_settings(
    state_dir_override: Option<PathBuf>,
    workers_override: Option<usize>,
) -> anyhow::Result<Settings> {
    let state_dir = match state_dir_override {
        Some(dir) => dir,
        None => state_dir()?,
    };
    let mut settings = Settings::new(state_dir);

    if let Ok(home) = std::env::var("HOIST_PROJECTS_HOME") {
        settings.projects_home = PathBuf::from(home);
    }
    if let Ok(secs) = std::env::var("HOIST_JOB_TIMEOUT_SECS") {
        let secs: u64 = secs.parse().context("HOIST_JOB_TIMEOUT_SECS must be an integer")?;
        settings.job_timeout = Duration::from_secs(secs);
    }
    if let Some(workers) = workers_override {
        settings.workers = workers.max(1);
    } else if let Ok(workers) = std::env::var("HOIST_WORKERS") {
        let workers: usize = workers.parse().context("HOIST_WORKERS must be an integer")?;
        settings.workers = workers.max(1);
    }
    if let Ok(command) = std::env::var("HOIST_PLAYBOOK_CMD") {
        settings.playbook_command = PathBuf::from(command);
    }

    Ok(settings)
}

/// Load the at-rest cipher key: HOIST_SECRET_KEY wins, otherwise the key
/// file in the state directory (generated on first start).
pub fn secret_cipher(settings: &Settings) -> anyhow::Result<SecretCipher> {
    if let Ok(encoded) = std::env::var("HOIST_SECRET_KEY") {
        return SecretCipher::from_base64(&encoded).context("HOIST_SECRET_KEY");
    }

    let key_path = settings.state_dir.join("cipher.key");
    if key_path.exists() {
        let encoded = std::fs::read_to_string(&key_path)
            .with_context(|| format!("reading {}", key_path.display()))?;
        return SecretCipher::from_base64(&encoded)
            .with_context(|| format!("parsing {}", key_path.display()));
    }

    let cipher = SecretCipher::generate();
    std::fs::write(&key_path, cipher.key_base64())
        .with_context(|| format!("writing {}", key_path.display()))?;
    restrict_to_owner(&key_path)?;
    tracing::info!(path = %key_path.display(), "generated new cipher key");
    Ok(cipher)
}

fn restrict_to_owner(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting {}", path.display()))?;
    Ok(())
}
