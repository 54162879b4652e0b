// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth token loading.
//!
//! Tokens are opaque strings at `${hubDir}/tokens/<account>.token`. The
//! directory is read-only at runtime; comparison happens in the daemon's
//! auth layer on the whitespace-trimmed contents.

use hub_core::is_valid_account_name;
use std::path::PathBuf;
use thiserror::Error;

/// Token store errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid account name: {0}")]
    InvalidAccount(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads tokens from a directory of `<account>.token` files.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load an account's token, trimmed. `None` when no token file exists.
    ///
    /// The account name is re-validated here so a hostile name can never
    /// reach the filesystem layer.
    pub fn load(&self, account: &str) -> Result<Option<String>, TokenError> {
        if !is_valid_account_name(account) {
            return Err(TokenError::InvalidAccount(account.to_string()));
        }
        let path = self.dir.join(format!("{account}.token"));
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List accounts that have a token file.
    pub fn list_accounts(&self) -> Result<Vec<String>, TokenError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut accounts = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".token") {
                if is_valid_account_name(stem) {
                    accounts.push(stem.to_string());
                }
            }
        }
        accounts.sort_unstable();
        Ok(accounts)
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
