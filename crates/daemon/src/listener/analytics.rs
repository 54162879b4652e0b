// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analytics handler.

use super::ListenCtx;
use crate::protocol::Response;
use hub_engine::compute_analytics;
use serde_json::json;

pub(super) fn handle_get_analytics(ctx: &ListenCtx) -> Response {
    let board = match ctx.board.load() {
        Ok(board) => board,
        Err(e) => return Response::error(format!("board error: {e}")),
    };
    let analytics = compute_analytics(&board, &ctx.trust.lock(), ctx.now_ms());
    Response::result(json!({ "analytics": analytics }))
}
