// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow handlers.
//!
//! Definitions live as TOML documents at `${hubDir}/workflows/<name>.toml`.

use super::ListenCtx;
use crate::protocol::Response;
use hub_core::ErrorKind;
use hub_workflow::{parse_workflow, WorkflowDef};
use serde_json::{json, Value};

/// Definition names share the account-name alphabet, which keeps them safe
/// as file stems.
fn is_valid_workflow_name(name: &str) -> bool {
    hub_core::is_valid_account_name(name)
}

fn load_definition(ctx: &ListenCtx, name: &str) -> Result<WorkflowDef, Response> {
    if !is_valid_workflow_name(name) {
        return Err(Response::error_kind(
            ErrorKind::Validation,
            format!("invalid workflow name: {name}"),
        ));
    }
    let path = ctx.config.workflows_dir.join(format!("{name}.toml"));
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Response::error_kind(
                ErrorKind::NotFound,
                format!("workflow not found: {name}"),
            ))
        }
        Err(e) => return Err(Response::error(format!("workflow read error: {e}"))),
    };
    parse_workflow(&text).map_err(|e| {
        Response::error_kind(ErrorKind::Validation, format!("invalid workflow {name}: {e}"))
    })
}

pub(super) fn handle_trigger(ctx: &ListenCtx, workflow: &str, context: Value) -> Response {
    if !ctx.features.workflow {
        return Response::error_kind(ErrorKind::Validation, "workflow engine disabled");
    }
    let def = match load_definition(ctx, workflow) {
        Ok(def) => def,
        Err(response) => return response,
    };

    match ctx.workflows.trigger(&def, context) {
        Ok(run) => Response::result(json!({ "run": run })),
        Err(e) => Response::error(format!("workflow trigger failed: {e}")),
    }
}

pub(super) fn handle_step_result(
    ctx: &ListenCtx,
    run_id: &str,
    step_id: &str,
    result: &str,
    error: Option<String>,
) -> Response {
    if !ctx.features.workflow {
        return Response::error_kind(ErrorKind::Validation, "workflow engine disabled");
    }

    let def = match definition_for_run(ctx, run_id) {
        Ok(def) => def,
        Err(response) => return response,
    };

    let outcome = match result {
        "accepted" | "rejected" => ctx.workflows.on_step_completed(run_id, step_id, result, &def),
        "failed" => {
            let error = error.unwrap_or_else(|| "step failed".to_string());
            ctx.workflows.on_step_failed(run_id, step_id, &error, &def)
        }
        other => {
            return Response::error_kind(
                ErrorKind::Validation,
                format!("invalid step result '{other}' (accepted, rejected, failed)"),
            )
        }
    };

    match outcome {
        Ok(()) => handle_get_run(ctx, run_id),
        Err(e) => Response::error(format!("workflow update failed: {e}")),
    }
}

pub(super) fn handle_cancel(ctx: &ListenCtx, run_id: &str) -> Response {
    if !ctx.features.workflow {
        return Response::error_kind(ErrorKind::Validation, "workflow engine disabled");
    }
    match ctx.workflows.cancel(run_id) {
        Ok(()) => handle_get_run(ctx, run_id),
        Err(e) => Response::error(format!("workflow cancel failed: {e}")),
    }
}

pub(super) fn handle_get_run(ctx: &ListenCtx, run_id: &str) -> Response {
    let runs = match ctx.workflows.runs() {
        Ok(runs) => runs,
        Err(e) => return Response::error(format!("workflow store error: {e}")),
    };
    let Some(run) = runs.runs.get(run_id) else {
        return Response::error_kind(
            ErrorKind::NotFound,
            format!("workflow run not found: {run_id}"),
        );
    };
    let steps: Vec<_> = runs.steps_for(run_id);
    Response::result(json!({ "run": run, "steps": steps }))
}

fn definition_for_run(ctx: &ListenCtx, run_id: &str) -> Result<WorkflowDef, Response> {
    let runs = ctx
        .workflows
        .runs()
        .map_err(|e| Response::error(format!("workflow store error: {e}")))?;
    let Some(run) = runs.runs.get(run_id) else {
        return Err(Response::error_kind(
            ErrorKind::NotFound,
            format!("workflow run not found: {run_id}"),
        ));
    };
    load_definition(ctx, &run.workflow_name)
}
