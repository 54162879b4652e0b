// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging handlers.

use super::{ConnState, ListenCtx};
use crate::protocol::Response;
use hub_core::{is_valid_account_name, ErrorKind, IdGen, UuidIdGen};
use hub_storage::Message;
use serde_json::json;

/// Default page size for `read_messages`.
const DEFAULT_READ_LIMIT: usize = 50;

pub(super) fn handle_send(
    ctx: &ListenCtx,
    conn: &ConnState,
    to: String,
    body: String,
    context: Option<String>,
    task_id: Option<String>,
) -> Response {
    if !is_valid_account_name(&to) {
        return Response::error_kind(ErrorKind::Validation, format!("invalid recipient: {to}"));
    }

    let message = Message {
        id: UuidIdGen.next(),
        from: conn.account.clone(),
        to,
        body,
        context,
        read: false,
        timestamp: hub_core::iso_utc(ctx.now_ms()),
        task_id,
        branch: None,
    };
    let message_id = message.id.clone();

    match ctx.messages.send(message) {
        Ok(()) => Response::result(json!({ "messageId": message_id })),
        Err(e) => Response::error(format!("message store error: {e}")),
    }
}

pub(super) fn handle_count_unread(ctx: &ListenCtx, conn: &ConnState) -> Response {
    match ctx.messages.count_unread(&conn.account) {
        Ok(count) => Response::result(json!({ "unread": count })),
        Err(e) => Response::error(format!("message store error: {e}")),
    }
}

pub(super) fn handle_read(ctx: &ListenCtx, conn: &ConnState, limit: Option<usize>) -> Response {
    let limit = limit.unwrap_or(DEFAULT_READ_LIMIT);
    match ctx.messages.read_messages(&conn.account, limit) {
        Ok(messages) => Response::result(json!({ "messages": messages })),
        Err(e) => Response::error(format!("message store error: {e}")),
    }
}
