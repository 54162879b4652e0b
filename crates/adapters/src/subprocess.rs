// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers.
//!
//! Acceptance commands run through `sh -c` with their stdout/stderr drained
//! line-by-line into a channel. Cancellation cascades from the caller's
//! token; the child is killed and both streams are drained to completion so
//! pipes never deadlock.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hub_core::StreamKind;

/// Default timeout for a single acceptance command.
pub const ACCEPTANCE_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Default overall timeout for a workspace's acceptance suite.
pub const ACCEPTANCE_SUITE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Subprocess errors.
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One forwarded output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub line: String,
}

/// How a streamed command finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Process exited; code is `None` when killed by a signal.
    Exited { code: Option<i32> },
    /// The per-command timeout elapsed; the child was killed.
    TimedOut,
    /// The caller's cancellation token fired; the child was killed.
    Cancelled,
}

impl CommandStatus {
    /// Acceptance semantics: only a clean zero exit passes.
    pub fn passed(&self) -> bool {
        matches!(self, CommandStatus::Exited { code: Some(0) })
    }
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Run one shell command in `dir`, streaming output lines to `tx`.
///
/// The command runs under `sh -c`. Returns when the process exits, the
/// timeout elapses, or `cancel` fires; in the latter two cases the child
/// receives a kill and remaining output is drained before returning.
pub async fn stream_command(
    command: &str,
    dir: &Path,
    timeout: Duration,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<OutputLine>,
) -> Result<CommandStatus, SubprocessError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SubprocessError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = spawn_line_reader(stdout, StreamKind::Stdout, tx.clone());
    let stderr_task = spawn_line_reader(stderr, StreamKind::Stderr, tx.clone());

    let status = tokio::select! {
        result = child.wait() => CommandStatus::Exited { code: result?.code() },
        _ = tokio::time::sleep(timeout) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            CommandStatus::TimedOut
        }
        _ = cancel.cancelled() => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            CommandStatus::Cancelled
        }
    };

    // Drain both streams fully before reporting
    let _ = stdout_task.await;
    let _ = stderr_task.await;

    Ok(status)
}

fn spawn_line_reader<R>(
    stream: Option<R>,
    kind: StreamKind,
    tx: mpsc::Sender<OutputLine>,
) -> tokio::task::JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(stream) = stream else {
            return;
        };
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            // Receiver gone means the caller stopped listening; keep draining
            // so the child can't block on a full pipe.
            let _ = tx.send(OutputLine { stream: kind, line }).await;
        }
    })
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
