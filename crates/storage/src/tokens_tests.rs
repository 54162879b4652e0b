// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn load_trims_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alice.token"), "secret-token\n").unwrap();
    let store = TokenStore::new(dir.path());

    assert_eq!(
        store.load("alice").unwrap().as_deref(),
        Some("secret-token")
    );
}

#[test]
fn missing_token_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    assert!(store.load("ghost").unwrap().is_none());
}

#[test]
fn hostile_account_names_never_hit_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    assert!(matches!(
        store.load("../../etc/passwd"),
        Err(TokenError::InvalidAccount(_))
    ));
}

#[test]
fn list_accounts_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bob.token"), "b").unwrap();
    std::fs::write(dir.path().join("alice.token"), "a").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let store = TokenStore::new(dir.path());

    assert_eq!(store.list_accounts().unwrap(), vec!["alice", "bob"]);
}

#[test]
fn list_accounts_missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("nope"));
    assert!(store.list_accounts().unwrap().is_empty());
}
