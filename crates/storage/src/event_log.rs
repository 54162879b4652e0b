// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable append-only NDJSON event log.
//!
//! One envelope per line. When the file grows past `max_bytes` it is rotated
//! to `<path>.old` (single generation). `prune` rewrites the file keeping
//! only entries younger than `max_age`. Queries parse per-line and skip
//! malformed entries rather than failing the whole read.

use hub_core::{iso_utc, Envelope};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default rotation threshold (100 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Default prune horizon (7 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default query result cap.
const DEFAULT_QUERY_LIMIT: usize = 100;

/// Event log errors.
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filter for [`EventLog::query`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Exact type, or a `PREFIX*` pattern.
    pub event_type: Option<String>,
    /// ISO-8601 lower bound (inclusive). Timestamps sort lexicographically.
    pub since: Option<String>,
    /// Maximum entries returned (most recent win). Defaults to 100.
    pub limit: Option<usize>,
}

/// Append-only NDJSON log.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    max_bytes: u64,
    max_age: Duration,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one envelope, rotating first if the file is over budget.
    pub fn append(&self, envelope: &Envelope) -> Result<(), EventLogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if self.current_size()? > self.max_bytes {
            self.rotate()?;
        }

        let mut line = serde_json::to_vec(envelope)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn current_size(&self) -> Result<u64, EventLogError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Rotate the log to `<path>.old`, replacing any previous generation.
    fn rotate(&self) -> Result<(), EventLogError> {
        let old = old_path(&self.path);
        match std::fs::rename(&self.path, &old) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop entries older than `max_age`. Returns how many were removed.
    pub fn prune(&self, now_ms: u64) -> Result<usize, EventLogError> {
        let horizon_ms = now_ms.saturating_sub(self.max_age.as_millis() as u64);
        let horizon = iso_utc(horizon_ms);

        let entries = self.read_all()?;
        let kept: Vec<&Envelope> = entries
            .iter()
            .filter(|env| env.timestamp.as_str() >= horizon.as_str())
            .collect();
        let dropped = entries.len() - kept.len();
        if dropped == 0 {
            return Ok(0);
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for env in &kept {
                let mut line = serde_json::to_vec(env)?;
                line.push(b'\n');
                tmp.write_all(&line)?;
            }
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(dropped)
    }

    /// Query the log, returning at most `limit` most-recent matches in
    /// chronological order.
    pub fn query(&self, query: &EventQuery) -> Result<Vec<Envelope>, EventLogError> {
        let mut matches: Vec<Envelope> = self
            .read_all()?
            .into_iter()
            .filter(|env| {
                if let Some(pattern) = &query.event_type {
                    if !type_matches(pattern, env.event.type_name()) {
                        return false;
                    }
                }
                if let Some(since) = &query.since {
                    if env.timestamp.as_str() < since.as_str() {
                        return false;
                    }
                }
                true
            })
            .collect();

        let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        if matches.len() > limit {
            matches.drain(..matches.len() - limit);
        }
        Ok(matches)
    }

    fn read_all(&self) -> Result<Vec<Envelope>, EventLogError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Envelope>(trimmed) {
                Ok(env) => entries.push(env),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping malformed event log entry",
                    );
                }
            }
        }
        Ok(entries)
    }
}

/// Exact type match, or `PREFIX*` prefix match.
fn type_matches(pattern: &str, event_type: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => event_type.starts_with(prefix),
        None => pattern == event_type,
    }
}

fn old_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events.ndjson".to_string());
    name.push_str(".old");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
