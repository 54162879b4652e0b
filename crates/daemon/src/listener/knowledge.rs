// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge index handlers.

use super::{ConnState, ListenCtx};
use crate::protocol::Response;
use hub_core::{ErrorKind, IdGen, UuidIdGen};
use hub_storage::Note;
use serde_json::json;

/// Default search result cap.
const DEFAULT_SEARCH_LIMIT: usize = 10;

pub(super) fn handle_search(ctx: &ListenCtx, query: &str, limit: Option<usize>) -> Response {
    if !ctx.features.knowledge_index {
        return Response::error_kind(ErrorKind::Validation, "knowledge index disabled");
    }
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match ctx.knowledge.search(query, limit) {
        Ok(notes) => Response::result(json!({ "notes": notes })),
        Err(e) => Response::error(format!("knowledge store error: {e}")),
    }
}

pub(super) fn handle_index(
    ctx: &ListenCtx,
    conn: &ConnState,
    title: String,
    body: String,
    tags: Vec<String>,
) -> Response {
    if !ctx.features.knowledge_index {
        return Response::error_kind(ErrorKind::Validation, "knowledge index disabled");
    }
    if title.trim().is_empty() {
        return Response::error_kind(ErrorKind::Validation, "note title must not be empty");
    }

    let note = Note {
        id: UuidIdGen.next(),
        account: conn.account.clone(),
        title,
        body,
        tags,
        indexed_at: hub_core::iso_utc(ctx.now_ms()),
    };
    let note_id = note.id.clone();
    match ctx.knowledge.index(note) {
        Ok(()) => Response::result(json!({ "noteId": note_id })),
        Err(e) => Response::error(format!("knowledge store error: {e}")),
    }
}
