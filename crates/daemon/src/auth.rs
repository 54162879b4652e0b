// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection authentication.
//!
//! The first frame on every connection must be
//! `{"type": "auth", "account": ..., "token": ...}`. The presented token is
//! compared byte-wise against the whitespace-trimmed contents of
//! `${hubDir}/tokens/<account>.token`.

use hub_core::is_valid_account_name;
use hub_storage::{TokenError, TokenStore};
use thiserror::Error;

/// Authentication failures. The `Display` text is the wire `error` field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid account name")]
    InvalidAccount,

    #[error("Unknown account")]
    UnknownAccount,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Auth unavailable")]
    Unavailable,
}

/// Validate an `(account, token)` pair against the token store.
pub fn authenticate(tokens: &TokenStore, account: &str, token: &str) -> Result<(), AuthError> {
    if !is_valid_account_name(account) {
        return Err(AuthError::InvalidAccount);
    }
    let stored = match tokens.load(account) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Err(AuthError::UnknownAccount),
        Err(TokenError::InvalidAccount(_)) => return Err(AuthError::InvalidAccount),
        Err(TokenError::Io(_)) => return Err(AuthError::Unavailable),
    };
    if stored.as_bytes() == token.as_bytes() {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
