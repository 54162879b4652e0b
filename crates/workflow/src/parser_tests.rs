// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::{OnFailure, AUTO_ASSIGN};

const RELEASE: &str = r#"
name = "release"
on_failure = "abort"
max_retries = 1
retro = true

[[step]]
id = "build"
title = "Build and test"
skills = ["rust"]

[step.handoff]
goal = "Produce a green build"
run_commands = ["cargo test"]

[[step]]
id = "ship"
title = "Ship it"
assign = "release-bot"
depends_on = ["build"]

[step.condition]
when = "step.build.result == 'accepted'"

[step.handoff]
goal = "Tag and publish"
"#;

#[test]
fn parses_full_definition() {
    let def = parse_workflow(RELEASE).unwrap();
    assert_eq!(def.name, "release");
    assert_eq!(def.version, 1);
    assert_eq!(def.on_failure, OnFailure::Abort);
    assert_eq!(def.max_retries, 1);
    assert!(def.retro);
    assert_eq!(def.steps.len(), 2);

    let build = def.step("build").unwrap();
    assert_eq!(build.assign, AUTO_ASSIGN);
    assert_eq!(build.skills, vec!["rust"]);
    assert_eq!(build.handoff.run_commands, vec!["cargo test"]);

    let ship = def.step("ship").unwrap();
    assert_eq!(ship.assign, "release-bot");
    assert_eq!(ship.depends_on, vec!["build"]);
    assert!(ship.condition.is_some());
}

#[test]
fn defaults_apply() {
    let def = parse_workflow(
        r#"
name = "tiny"

[[step]]
id = "only"

[step.handoff]
goal = "Do the one thing"
"#,
    )
    .unwrap();
    assert_eq!(def.on_failure, OnFailure::Notify);
    assert_eq!(def.max_retries, 0);
    assert!(!def.retro);
    assert_eq!(def.steps[0].assign, AUTO_ASSIGN);
    assert!(def.steps[0].depends_on.is_empty());
}

#[test]
fn rejects_unknown_dependency() {
    let err = parse_workflow(
        r#"
name = "broken"

[[step]]
id = "a"
depends_on = ["ghost"]

[step.handoff]
goal = "g"
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(ValidateError::UnknownDependency { .. })
    ));
}

#[test]
fn rejects_cycle() {
    let err = parse_workflow(
        r#"
name = "loopy"

[[step]]
id = "a"
depends_on = ["b"]

[step.handoff]
goal = "g"

[[step]]
id = "b"
depends_on = ["a"]

[step.handoff]
goal = "g"
"#,
    )
    .unwrap_err();
    let ParseError::Invalid(ValidateError::Cycle(members)) = err else {
        panic!("expected cycle error, got {err:?}");
    };
    assert_eq!(members, "a, b");
}

#[test]
fn rejects_duplicate_step_ids() {
    let err = parse_workflow(
        r#"
name = "dupes"

[[step]]
id = "a"

[step.handoff]
goal = "g"

[[step]]
id = "a"

[step.handoff]
goal = "g"
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(ValidateError::DuplicateStepId(_))
    ));
}

#[test]
fn rejects_empty_goal() {
    let err = parse_workflow(
        r#"
name = "hollow"

[[step]]
id = "a"

[step.handoff]
goal = "  "
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::EmptyGoal { .. }));
}

#[test]
fn rejects_bad_condition_grammar() {
    let err = parse_workflow(
        r#"
name = "badcond"

[[step]]
id = "a"

[step.condition]
when = "step.a.result ="

[step.handoff]
goal = "g"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Condition { .. }));
}

#[test]
fn rejects_condition_referencing_unknown_step() {
    let err = parse_workflow(
        r#"
name = "dangling"

[[step]]
id = "a"

[step.condition]
when = "step.ghost.result == 'accepted'"

[step.handoff]
goal = "g"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::ConditionUnknownStep { referenced, .. } if referenced == "ghost"));
}

#[test]
fn rejects_missing_steps() {
    let err = parse_workflow("name = \"empty\"\nstep = []\n").unwrap_err();
    assert!(matches!(err, ParseError::Invalid(ValidateError::NoSteps)));
}
