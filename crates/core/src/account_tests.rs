// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "alice" },
    digits_first = { "0x-agent" },
    underscores = { "build_bot" },
    dashes = { "review-agent-2" },
    single_char = { "a" },
)]
fn valid_names(name: &str) {
    assert!(is_valid_account_name(name), "{name} should be valid");
}

#[parameterized(
    empty = { "" },
    leading_dash = { "-alice" },
    leading_underscore = { "_alice" },
    dot = { "a.b" },
    slash = { "a/b" },
    traversal = { "../etc" },
    space = { "a b" },
    unicode = { "ålice" },
)]
fn invalid_names(name: &str) {
    assert!(!is_valid_account_name(name), "{name} should be invalid");
}

#[test]
fn name_length_cap_is_63_chars_total() {
    let max = "a".repeat(63);
    assert!(is_valid_account_name(&max));
    let over = "a".repeat(64);
    assert!(!is_valid_account_name(&over));
}
