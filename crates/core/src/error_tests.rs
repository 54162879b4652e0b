// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    auth = { ErrorKind::Auth, "auth" },
    rate_limit = { ErrorKind::RateLimit, "rate_limit" },
    context_overflow = { ErrorKind::ContextOverflow, "context_overflow" },
    not_found = { ErrorKind::NotFound, "not_found" },
    validation = { ErrorKind::Validation, "validation" },
    unknown = { ErrorKind::Unknown, "unknown" },
)]
fn wire_strings(kind: ErrorKind, expected: &str) {
    assert_eq!(kind.as_str(), expected);
    assert_eq!(kind.to_string(), expected);
}

#[test]
fn serde_uses_snake_case() {
    let json = serde_json::to_string(&ErrorKind::ToolError).unwrap();
    assert_eq!(json, "\"tool_error\"");

    let parsed: ErrorKind = serde_json::from_str("\"overloaded\"").unwrap();
    assert_eq!(parsed, ErrorKind::Overloaded);
}
