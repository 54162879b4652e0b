// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store_with(account: &str, token: &str) -> (tempfile::TempDir, TokenStore) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(format!("{account}.token")), token).unwrap();
    let store = TokenStore::new(dir.path());
    (dir, store)
}

#[test]
fn valid_token_authenticates() {
    let (_dir, store) = store_with("alice", "secret\n");
    assert_eq!(authenticate(&store, "alice", "secret"), Ok(()));
}

#[test]
fn stored_token_is_trimmed_before_compare() {
    let (_dir, store) = store_with("alice", "  secret  \n\n");
    assert_eq!(authenticate(&store, "alice", "secret"), Ok(()));
}

#[test]
fn wrong_token_is_rejected() {
    let (_dir, store) = store_with("alice", "secret");
    assert_eq!(
        authenticate(&store, "alice", "nope"),
        Err(AuthError::InvalidToken)
    );
    assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token");
}

#[test]
fn unknown_account_is_rejected() {
    let (_dir, store) = store_with("alice", "secret");
    assert_eq!(
        authenticate(&store, "bob", "secret"),
        Err(AuthError::UnknownAccount)
    );
}

#[test]
fn malformed_account_names_are_rejected_before_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("never-created"));
    assert_eq!(
        authenticate(&store, "../sneaky", "x"),
        Err(AuthError::InvalidAccount)
    );
}

#[test]
fn empty_presented_token_never_matches() {
    let (_dir, store) = store_with("alice", "secret");
    assert_eq!(
        authenticate(&store, "alice", ""),
        Err(AuthError::InvalidToken)
    );
}
