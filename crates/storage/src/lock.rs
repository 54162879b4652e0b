// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory directory lock with TTL.
//!
//! Writers create `<name>.lock/` next to the protected file; `mkdir` is
//! atomic on every platform we care about. A lock older than its TTL is
//! considered abandoned (holder crashed) and is broken by the next acquirer.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// Default TTL after which a held lock is presumed abandoned.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);

/// How long `acquire` waits before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for a lock.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lock errors.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out acquiring lock {0}")]
    Timeout(PathBuf),

    #[error("IO error on lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A held directory lock; released on drop.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Acquire the lock named `<stem>.lock` beside `target`.
    ///
    /// Blocks (polling) up to `timeout`; breaks locks older than `ttl`.
    pub fn acquire(target: &Path, ttl: Duration, timeout: Duration) -> Result<Self, LockError> {
        let path = lock_path(target);
        let start = Instant::now();

        loop {
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    // Best-effort holder pid for debugging
                    let _ = std::fs::write(path.join("pid"), std::process::id().to_string());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_age(&path).map(|age| age > ttl).unwrap_or(false) {
                        warn!(lock = %path.display(), "breaking stale lock (TTL exceeded)");
                        let _ = std::fs::remove_dir_all(&path);
                        continue;
                    }
                    if start.elapsed() >= timeout {
                        return Err(LockError::Timeout(path));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(source) => return Err(LockError::Io { path, source }),
            }
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    name.push_str(".lock");
    target.with_file_name(name)
}

fn lock_age(path: &Path) -> Option<Duration> {
    path.metadata()
        .ok()?
        .modified()
        .ok()?
        .elapsed()
        .ok()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
