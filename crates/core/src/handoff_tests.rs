// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record_with(content: &str) -> HandoffRecord {
    HandoffRecord {
        id: "h1".into(),
        from: "lead".into(),
        to: "worker".into(),
        content: content.into(),
        context: "handoff".into(),
        timestamp: "2026-08-01T00:00:00.000Z".into(),
        task_id: Some("t1".into()),
        branch: None,
    }
}

#[test]
fn minimal_payload_parses() {
    let record = record_with(r#"{"goal":"ship the fix"}"#);
    let payload = record.payload().unwrap();
    assert_eq!(payload.goal, "ship the fix");
    assert!(payload.run_commands.is_empty());
    assert!(payload.criticality.is_none());
}

#[test]
fn enriched_payload_parses() {
    let record = record_with(
        r#"{
            "goal": "migrate the schema",
            "acceptanceCriteria": ["migration applies", "rollback tested"],
            "runCommands": ["cargo test", "./verify.sh"],
            "blockedBy": ["t0"],
            "criticality": "critical",
            "reversibility": "irreversible",
            "estimatedDurationMinutes": 90,
            "requiredSkills": ["sql"],
            "delegationDepth": 2
        }"#,
    );
    let payload = record.payload().unwrap();
    assert_eq!(payload.run_commands.len(), 2);
    assert_eq!(payload.criticality, Some(Criticality::Critical));
    assert_eq!(payload.reversibility, Some(Reversibility::Irreversible));
    assert_eq!(payload.delegation_depth, Some(2));
}

#[test]
fn invalid_json_is_an_error() {
    let record = record_with("not json");
    assert!(matches!(
        record.payload(),
        Err(HandoffParseError::Json(_))
    ));
}

#[test]
fn empty_goal_is_an_error() {
    let record = record_with(r#"{"goal":"  "}"#);
    assert!(matches!(
        record.payload(),
        Err(HandoffParseError::MissingGoal)
    ));
}

#[test]
fn criticality_orders_by_severity() {
    assert!(Criticality::Low < Criticality::Medium);
    assert!(Criticality::High < Criticality::Critical);
}

#[test]
fn payload_round_trip() {
    let payload = HandoffPayload {
        goal: "do the thing".into(),
        run_commands: vec!["make check".into()],
        criticality: Some(Criticality::High),
        ..HandoffPayload::default()
    };
    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"runCommands\""));
    let parsed: HandoffPayload = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, payload);
}
