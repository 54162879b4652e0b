// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn ctx_with(steps: &[(&str, &str)]) -> HashMap<String, StepFacts> {
    steps
        .iter()
        .map(|(id, result)| {
            (
                id.to_string(),
                StepFacts {
                    result: Some(result.to_string()),
                    duration_ms: Some(1200),
                    assignee: Some("alice".to_string()),
                },
            )
        })
        .collect()
}

#[test]
fn parses_simple_equality() {
    let expr = parse("step.build.result == 'accepted'").unwrap();
    assert!(matches!(expr, Expr::Cmp { op: CmpOp::Eq, .. }));
}

#[test]
fn precedence_and_binds_tighter_than_or() {
    // a == 'x' || b == 'y' && c == 'z'  parses as  a || (b && c)
    let expr = parse("step.a.result == 'x' || step.b.result == 'y' && step.c.result == 'z'")
        .unwrap();
    assert!(matches!(expr, Expr::Or(_, _)));
}

#[parameterized(
    double_equals_only = { "step.a.result = 'x'" },
    bare_operand = { "step.a.result" },
    dangling_and = { "step.a.result == 'x' &&" },
    unterminated = { "step.a.result == 'x" },
    bad_char = { "step.a.result == $x" },
    empty = { "" },
    trailing_garbage = { "step.a.result == 'x' 'y'" },
    unmatched_paren = { "(step.a.result == 'x'" },
)]
fn rejects_malformed(input: &str) {
    assert!(parse(input).is_err(), "{input:?} should not parse");
}

#[test]
fn eval_step_result() {
    let steps = ctx_with(&[("build", "accepted")]);
    let trigger = json!({});
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };

    assert!(check("step.build.result == 'accepted'", &ctx).unwrap());
    assert!(!check("step.build.result == 'rejected'", &ctx).unwrap());
    assert!(check("step.build.result != 'rejected'", &ctx).unwrap());
}

#[test]
fn eval_duration_and_assignee() {
    let steps = ctx_with(&[("build", "accepted")]);
    let trigger = json!({});
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };

    assert!(check("step.build.duration_ms == 1200", &ctx).unwrap());
    assert!(check("step.build.assignee == \"alice\"", &ctx).unwrap());
}

#[test]
fn eval_logical_operators() {
    let steps = ctx_with(&[("a", "accepted"), ("b", "rejected")]);
    let trigger = json!({});
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };

    assert!(check("step.a.result == 'accepted' && step.b.result == 'rejected'", &ctx).unwrap());
    assert!(!check("step.a.result == 'accepted' && step.b.result == 'accepted'", &ctx).unwrap());
    assert!(check("step.a.result == 'nope' || step.b.result == 'rejected'", &ctx).unwrap());
    assert!(check(
        "(step.a.result == 'nope' || step.b.result == 'rejected') && step.a.result == 'accepted'",
        &ctx
    )
    .unwrap());
}

#[test]
fn eval_trigger_context_paths() {
    let steps = HashMap::new();
    let trigger = json!({"source": "release", "urgent": true});
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };

    assert!(check("trigger.context.source == 'release'", &ctx).unwrap());
    assert!(check("trigger.context.urgent == 'true'", &ctx).unwrap());
    assert!(!check("trigger.context.missing == 'x'", &ctx).unwrap());
}

#[test]
fn eval_trigger_context_as_scalar() {
    let steps = HashMap::new();
    let trigger = json!("manual");
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };
    assert!(check("trigger.context == 'manual'", &ctx).unwrap());
}

#[test]
fn unknown_step_resolves_to_null() {
    let steps = HashMap::new();
    let trigger = json!({});
    let ctx = EvalContext {
        steps: &steps,
        trigger_context: &trigger,
    };

    assert!(!check("step.ghost.result == 'accepted'", &ctx).unwrap());
    assert!(check("step.ghost.result != 'accepted'", &ctx).unwrap());
}

#[test]
fn paths_walks_all_references() {
    let expr = parse("step.a.result == 'x' && trigger.context.kind != 'y'").unwrap();
    let paths = expr.paths();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0][1], "a");
    assert_eq!(paths[1][0], "trigger");
}
