// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised execution of one job process.

use crate::command::CommandSpec;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to build job command: {0}")]
    CommandBuildFailed(String),
    #[error("failed to run job process: {0}")]
    StartFailed(String),
    #[error("job process exited with {status}")]
    WaitFailed {
        status: std::process::ExitStatus,
        output: String,
    },
    #[error("job process exceeded the {timeout:?} execution timeout and was killed")]
    TimedOut { timeout: Duration, output: String },
}

impl RunError {
    /// Output captured before the process failed, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            RunError::WaitFailed { output, .. } | RunError::TimedOut { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}

/// Run a job process to completion under a wall-clock timeout.
///
/// The child gets a cleared environment plus the command's explicit list.
/// `stdin_secret` (password-based auth) is written once, newline
/// terminated, right after start, and the pipe is closed. Stdout and
/// stderr are captured into one combined buffer in arrival order. On
/// timeout the child is killed and [`RunError::TimedOut`] carries the
/// output so far; the timer is dropped on normal completion.
pub async fn run(
    spec: &CommandSpec,
    stdin_secret: Option<&str>,
    timeout: Duration,
) -> Result<String, RunError> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .env_clear()
        .stdin(if stdin_secret.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let mut child = command.spawn().map_err(|err| RunError::StartFailed(err.to_string()))?;

    if let Some(secret) = stdin_secret {
        if let Some(mut stdin) = child.stdin.take() {
            let line = format!("{secret}\n");
            if let Err(err) = stdin.write_all(line.as_bytes()).await {
                tracing::warn!(%err, "failed to write password to job stdin");
            }
            // close the pipe so an interactive prompt sees EOF after the line
        }
    }

    let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(capture(stdout, buffer.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(capture(stderr, buffer.clone())));
    }

    // The timeout is disarmed simply by dropping the elapsed future on
    // normal completion; it can never kill a later process.
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            status.map_err(|err| RunError::StartFailed(format!("wait: {err}")))?
        }
        Err(_elapsed) => {
            if let Err(err) = child.start_kill() {
                tracing::warn!(%err, "failed to kill timed-out job process");
            }
            if let Err(err) = child.wait().await {
                tracing::warn!(%err, "failed to reap timed-out job process");
            }
            for reader in readers {
                let _ = reader.await;
            }
            return Err(RunError::TimedOut { timeout, output: drain(&buffer) });
        }
    };

    for reader in readers {
        let _ = reader.await;
    }
    let output = drain(&buffer);

    if !status.success() {
        return Err(RunError::WaitFailed { status, output });
    }
    Ok(output)
}

async fn capture<R>(mut reader: R, buffer: Arc<Mutex<Vec<u8>>>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buffer.lock().extend_from_slice(&chunk[..n]),
        }
    }
}

fn drain(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock()).into_owned()
}

#[cfg(test)]
#[path = "execute_tests.rs"]
mod tests;
