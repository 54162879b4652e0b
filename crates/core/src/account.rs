// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account naming and session records.

use serde::{Deserialize, Serialize};

/// Maximum length of an account name.
const MAX_ACCOUNT_NAME_LEN: usize = 63;

/// Check whether a string is a legal account name.
///
/// Legal names start with an ASCII alphanumeric and continue with
/// alphanumerics, `_`, or `-`, up to 63 characters total. Account names are
/// used as token file stems, so this also guards against path traversal.
pub fn is_valid_account_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_ACCOUNT_NAME_LEN {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// An authenticated account on one connection.
///
/// Exactly one session exists per `(account, connection)` pair; disconnect
/// removes the session along with any subscriptions it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSession {
    pub account: String,
    pub conn_id: u64,
    /// Epoch ms when the session authenticated.
    pub connected_at_ms: u64,
}

impl AccountSession {
    pub fn new(account: impl Into<String>, conn_id: u64, connected_at_ms: u64) -> Self {
        Self {
            account: account.into(),
            conn_id,
            connected_at_ms,
        }
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
