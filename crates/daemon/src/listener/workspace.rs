// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace registry handlers.

use super::ListenCtx;
use crate::protocol::Response;
use hub_core::{ErrorKind, IdGen, UuidIdGen};
use hub_storage::{WorkspaceRecord, WorkspaceStatus};
use serde_json::json;

pub(super) async fn handle_prepare(ctx: &ListenCtx, task_id: &str, branch: &str) -> Response {
    let board = match ctx.board.load() {
        Ok(board) => board,
        Err(e) => return Response::error(format!("board error: {e}")),
    };
    if board.get(task_id).is_none() {
        return Response::error_kind(ErrorKind::NotFound, format!("task not found: {task_id}"));
    }

    let path = match ctx.workspace_provider.prepare(task_id, branch).await {
        Ok(path) => path,
        Err(e) => return Response::error_kind(ErrorKind::ToolError, e.to_string()),
    };

    let record = WorkspaceRecord {
        id: format!("ws-{}", UuidIdGen.next()),
        task_id: task_id.to_string(),
        path,
        branch: branch.to_string(),
        status: WorkspaceStatus::Active,
        created_at: hub_core::iso_utc(ctx.now_ms()),
    };
    if let Err(e) = ctx.workspaces.register(record.clone()) {
        return Response::error(format!("workspace store error: {e}"));
    }

    Response::result(json!({ "workspace": record }))
}

pub(super) fn handle_status(
    ctx: &ListenCtx,
    workspace_id: Option<String>,
    task_id: Option<String>,
) -> Response {
    match (workspace_id, task_id) {
        (Some(id), _) => match ctx.workspaces.get(&id) {
            Ok(Some(record)) => Response::result(json!({ "workspaces": [record] })),
            Ok(None) => {
                Response::error_kind(ErrorKind::NotFound, format!("workspace not found: {id}"))
            }
            Err(e) => Response::error(format!("workspace store error: {e}")),
        },
        (None, Some(task_id)) => match ctx.workspaces.for_task(&task_id) {
            Ok(records) => Response::result(json!({ "workspaces": records })),
            Err(e) => Response::error(format!("workspace store error: {e}")),
        },
        (None, None) => Response::error_kind(
            ErrorKind::Validation,
            "workspaceId or taskId required",
        ),
    }
}

pub(super) async fn handle_cleanup(ctx: &ListenCtx, workspace_id: &str) -> Response {
    let record = match ctx.workspaces.get(workspace_id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            return Response::error_kind(
                ErrorKind::NotFound,
                format!("workspace not found: {workspace_id}"),
            )
        }
        Err(e) => return Response::error(format!("workspace store error: {e}")),
    };

    if let Err(e) = ctx.workspace_provider.cleanup(&record.path).await {
        return Response::error_kind(ErrorKind::ToolError, e.to_string());
    }
    if let Err(e) = ctx
        .workspaces
        .set_status(workspace_id, WorkspaceStatus::Released)
    {
        return Response::error(format!("workspace store error: {e}"));
    }

    Response::result(json!({ "released": workspace_id }))
}
