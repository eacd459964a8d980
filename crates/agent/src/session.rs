// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent process lifecycle: spawn, key loading, guaranteed teardown.

use crate::key;
use ssh_key::LineEnding;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::time::Instant;

/// How long to wait for the agent's control socket to appear.
const SOCKET_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to start ssh-agent: {0}")]
    StartFailed(String),
    #[error("failed to decrypt ssh key: {0}")]
    KeyDecryptFailed(String),
    #[error("ssh-agent rejected key: {0}")]
    AgentAddFailed(String),
}

/// A running per-job `ssh-agent`.
///
/// The session owns the agent process and its control socket exclusively.
/// Call [`release`](Self::release) on every exit path; dropping without a
/// release still kills the agent (kill-on-drop) and unlinks the socket.
pub struct SshAgentSession {
    child: Child,
    socket_path: PathBuf,
    pid: u32,
    released: bool,
}

impl SshAgentSession {
    /// Spawn a fresh agent with a unique control socket under `runtime_dir`.
    pub async fn start(runtime_dir: &Path) -> Result<Self, AgentError> {
        std::fs::create_dir_all(runtime_dir)
            .map_err(|err| AgentError::StartFailed(format!("runtime dir: {err}")))?;
        let socket_path = runtime_dir.join(format!("agent-{}.sock", nanoid::nanoid!(10)));

        let mut child = Command::new("ssh-agent")
            .arg("-D")
            .arg("-a")
            .arg(&socket_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AgentError::StartFailed(err.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| AgentError::StartFailed("agent exited before reporting a pid".into()))?;

        // The socket appears asynchronously; the agent is unusable until then.
        let deadline = Instant::now() + SOCKET_WAIT;
        while !socket_path.exists() {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(AgentError::StartFailed(format!(
                    "ssh-agent exited during startup: {status}"
                )));
            }
            if Instant::now() >= deadline {
                if let Err(err) = child.start_kill() {
                    tracing::warn!(%err, "failed to kill unresponsive ssh-agent");
                }
                return Err(AgentError::StartFailed("timed out waiting for agent socket".into()));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tracing::debug!(pid, socket = %socket_path.display(), "started ssh-agent");
        Ok(Self { child, socket_path, pid, released: false })
    }

    /// Control socket path for the child process environment.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Agent process id for the child process environment.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Load a private key into the agent.
    ///
    /// Passphrase-protected keys are decrypted first; a decryption failure
    /// aborts the whole execution before any process is started.
    pub async fn add_key(
        &self,
        key_bytes: &[u8],
        passphrase: Option<&str>,
    ) -> Result<(), AgentError> {
        let unlocked = key::unlock_key(key_bytes, passphrase)?;
        let pem = unlocked
            .to_openssh(LineEnding::LF)
            .map_err(|err| AgentError::KeyDecryptFailed(err.to_string()))?;

        let mut child = Command::new("ssh-add")
            .arg("-")
            .env("SSH_AUTH_SOCK", &self.socket_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| AgentError::AgentAddFailed(err.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(pem.as_bytes())
                .await
                .map_err(|err| AgentError::AgentAddFailed(err.to_string()))?;
            // close the pipe so ssh-add sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| AgentError::AgentAddFailed(err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::AgentAddFailed(stderr.trim().to_string()));
        }
        Ok(())
    }

    /// Terminate the agent and remove its socket. Invoked exactly once, on
    /// every exit path of the owning execution.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(err) = self.child.start_kill() {
            tracing::warn!(pid = self.pid, %err, "failed to signal ssh-agent");
        }
        if let Err(err) = self.child.wait().await {
            tracing::warn!(pid = self.pid, %err, "failed to reap ssh-agent");
        }
        remove_socket(&self.socket_path);
        tracing::debug!(pid = self.pid, "released ssh-agent");
    }
}

impl Drop for SshAgentSession {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // kill_on_drop reaps the agent process; the socket file is ours.
        let _ = self.child.start_kill();
        remove_socket(&self.socket_path);
    }
}

fn remove_socket(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(socket = %path.display(), %err, "failed to remove agent socket");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
