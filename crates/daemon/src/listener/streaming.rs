// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription handlers.

use super::{ConnState, ListenCtx};
use crate::protocol::Response;
use hub_core::ErrorKind;
use serde_json::json;

pub(super) fn handle_subscribe(
    ctx: &ListenCtx,
    conn: &ConnState,
    patterns: Vec<String>,
) -> Response {
    if !ctx.features.streaming {
        return Response::error_kind(ErrorKind::Validation, "streaming disabled");
    }
    if patterns.is_empty() {
        return Response::error_kind(ErrorKind::Validation, "patterns must not be empty");
    }
    if let Some(bad) = patterns.iter().find(|p| p.is_empty()) {
        return Response::error_kind(
            ErrorKind::Validation,
            format!("invalid pattern: {bad:?}"),
        );
    }

    ctx.subs
        .subscribe(conn.conn_id, &conn.account, patterns.clone(), conn.tx.clone());
    Response::result(json!({ "subscribed": patterns }))
}

pub(super) fn handle_unsubscribe(
    ctx: &ListenCtx,
    conn: &ConnState,
    patterns: Option<Vec<String>>,
) -> Response {
    ctx.subs.unsubscribe(conn.conn_id, patterns);
    Response::result(json!({ "unsubscribed": true }))
}
