// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn task_started_wire_shape() {
    let event = Event::TaskStarted {
        task_id: "t1".to_string(),
        agent: "alice".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "TASK_STARTED",
            "taskId": "t1",
            "agent": "alice",
        })
    );
}

#[test]
fn type_name_matches_serialized_tag() {
    let events = vec![
        Event::TaskCreated {
            task_id: "t".into(),
            title: "x".into(),
            agent: None,
        },
        Event::TaskRejected {
            task_id: "t".into(),
            agent: Some("a".into()),
            reason: "r".into(),
        },
        Event::WorkflowStepFailed {
            run_id: "r".into(),
            step_id: "s".into(),
            error: "e".into(),
            attempt: 1,
            will_retry: true,
        },
        Event::TddTestOutput {
            task_id: "t".into(),
            command: "cargo test".into(),
            stream: StreamKind::Stdout,
            line: "ok".into(),
        },
        Event::TrustUpdate {
            agent: "a".into(),
            delta: -5,
            score: 45,
            reason: "failed".into(),
        },
        Event::CircuitBreakerOpen {
            agent: "a".into(),
            trigger: "repeated_failures".into(),
            reason: "3 failures in window".into(),
            revoked_task_ids: vec!["t1".into()],
        },
        Event::AccountHealth {
            account: "a".into(),
            status: "ok".into(),
            detail: None,
        },
    ];
    for event in events {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.type_name(), "tag mismatch: {:?}", event);
    }
}

#[test]
fn round_trip_preserves_fields() {
    let event = Event::WorkflowStepCompleted {
        run_id: "run-1".into(),
        step_id: "build".into(),
        result: "accepted".into(),
        duration_ms: 4200,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"durationMs\":4200"));
    let parsed: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, event);
}

#[test]
fn envelope_flattens_event() {
    let envelope = Envelope {
        id: "ev-1".into(),
        timestamp: "2026-08-01T00:00:00.000Z".into(),
        event: Event::ProgressUpdate {
            task_id: "t1".into(),
            agent: "alice".into(),
            message: "halfway".into(),
            percent: Some(50),
        },
    };
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["id"], "ev-1");
    assert_eq!(json["type"], "PROGRESS_UPDATE");
    assert_eq!(json["percent"], 50);

    let parsed: Envelope = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, envelope);
}

#[test]
fn task_id_helper_covers_receipt_events() {
    let event = Event::TaskVerified {
        receipt: VerificationReceipt {
            task_id: "t9".into(),
            delegator: "lead".into(),
            delegatee: "worker".into(),
            spec_payload_hash: "abc".into(),
            verdict: "passed".into(),
            method: "auto-acceptance".into(),
            timestamp: "2026-08-01T00:00:00.000Z".into(),
        },
        passed: true,
    };
    assert_eq!(event.task_id(), Some("t9"));

    let event = Event::CircuitBreakerClosed { agent: "a".into() };
    assert_eq!(event.task_id(), None);
}

#[test]
fn receipt_wire_uses_camel_case() {
    let receipt = VerificationReceipt {
        task_id: "t1".into(),
        delegator: "lead".into(),
        delegatee: "worker".into(),
        spec_payload_hash: "deadbeef".into(),
        verdict: "failed".into(),
        method: "auto-acceptance".into(),
        timestamp: "2026-08-01T00:00:00.000Z".into(),
    };
    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json["specPayloadHash"], "deadbeef");
    assert_eq!(json["taskId"], "t1");
}
