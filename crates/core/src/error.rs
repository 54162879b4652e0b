// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds carried on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of daemon-level errors.
///
/// Every wire error object is `{"type": "error", "error": <kind-or-message>}`,
/// where handlers use the kind string when the failure is one of these
/// categories and a free-form message otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Overloaded,
    Timeout,
    Abort,
    ContextOverflow,
    ToolError,
    NotFound,
    Validation,
    Network,
    Unknown,
}

impl ErrorKind {
    /// Wire string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Overloaded => "overloaded",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Abort => "abort",
            ErrorKind::ContextOverflow => "context_overflow",
            ErrorKind::ToolError => "tool_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
