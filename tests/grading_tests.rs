mod common;

use common::{pod_exercise, three_failing_rules, MALFORMED, POD};
use dojo::grading::validate;
use dojo::{Exercise, RuleKind};
use serde_json::json;

#[test]
fn every_rule_runs_and_the_summary_counts_the_rest() {
    let verdict = validate(&three_failing_rules(), "", 0);
    assert!(!verdict.passed);
    assert_eq!(verdict.results.len(), 3);
    assert_eq!(verdict.failed_count(), 3);
    assert_eq!(verdict.summary, "Declare a provider.\n\n(2 more error(s))");

    let kinds: Vec<RuleKind> = verdict.results.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, [RuleKind::Syntax, RuleKind::Semantic, RuleKind::Intention]);
}

#[test]
fn summary_starts_at_the_first_failure_in_declared_order() {
    let verdict = validate(&three_failing_rules(), r#"provider "aws" {}"#, 0);
    assert!(verdict.results[0].passed);
    assert_eq!(verdict.summary, "Declare a resource.\n\n(1 more error(s))");

    let verdict = validate(&three_failing_rules(), "provider\nresource", 0);
    assert_eq!(verdict.summary, "Set a region.");
}

#[test]
fn passing_submissions_get_the_success_message() {
    let verdict = validate(&pod_exercise(), POD, 0);
    assert!(verdict.passed);
    assert!(verdict.results.iter().all(|r| r.passed && r.error_message.is_none()));
    assert_eq!(verdict.summary, "Pod manifest looks good!");
}

#[test]
fn hint_table_for_three_hints() {
    let exercise = three_failing_rules();
    let expected = [
        (0, None, 0),
        (1, None, 0),
        (2, Some("two"), 2),
        (3, Some("two"), 2),
        (4, Some("three"), 3),
        (100, Some("three"), 3),
    ];
    for (failures, hint, used) in expected {
        let verdict = validate(&exercise, "", failures);
        assert_eq!(verdict.next_hint.as_deref(), hint, "failure count {failures}");
        assert_eq!(verdict.hints_used, used, "failure count {failures}");
    }
}

#[test]
fn passing_never_reveals_a_hint() {
    let verdict = validate(&pod_exercise(), POD, 100);
    assert!(verdict.passed);
    assert_eq!(verdict.next_hint, None);
    assert_eq!(verdict.hints_used, 0);
}

#[test]
fn malformed_documents_fail_the_document_rules() {
    let verdict = validate(&pod_exercise(), MALFORMED, 2);
    assert!(!verdict.passed);
    assert_eq!(verdict.failed_count(), 3);
    assert_eq!(verdict.summary, "Your manifest is not valid YAML.\n\n(2 more error(s))");
    assert_eq!(verdict.next_hint.as_deref(), Some("Containers live under spec.containers."));
}

#[test]
fn broken_rules_fail_with_an_internal_error_and_do_not_stop_the_rest() {
    let exercise: Exercise = serde_json::from_value(json!({
        "id": "broken",
        "validations": [
            { "type": "syntax", "check": { "matches": "(" }, "errorMessage": "bad-regex", "failMessage": "x" },
            { "type": "semantic", "check": { "custom": "process.exit(1)" }, "errorMessage": "denied", "failMessage": "y" },
            { "type": "semantic", "check": { "custom": "return (" }, "errorMessage": "unparsable", "failMessage": "z" },
            { "type": "intention", "check": { "contains": "kind" }, "errorMessage": "kind", "failMessage": "k" }
        ]
    }))
    .unwrap();

    let verdict = validate(&exercise, POD, 0);
    let messages: Vec<Option<&str>> = verdict.results.iter().map(|r| r.error_message.as_deref()).collect();
    assert_eq!(
        messages,
        [
            Some("internal validation error: bad-regex"),
            Some("internal validation error: denied"),
            Some("internal validation error: unparsable"),
            None,
        ]
    );
    assert!(verdict.results[3].passed);
    assert_eq!(verdict.summary, "internal validation error: bad-regex\n\n(2 more error(s))");
}

#[test]
fn pure_custom_rules_supply_their_own_messages() {
    let exercise: Exercise = serde_json::from_value(json!({
        "id": "custom",
        "validations": [
            {
                "type": "intention",
                "check": { "custom": "const r = getPath(code, 'spec.replicas'); return r >= 3 ? true : { passed: false, errorMessage: 'Need 3 replicas, found ' + r };" },
                "errorMessage": "replicas",
                "failMessage": "Scale the pod."
            },
            {
                "type": "intention",
                "check": { "custom": "code.includes('volumes')" },
                "errorMessage": "volumes",
                "failMessage": "Mount a volume."
            }
        ]
    }))
    .unwrap();

    let verdict = validate(&exercise, POD, 0);
    assert_eq!(verdict.results[0].error_message.as_deref(), Some("Need 3 replicas, found 2"));
    assert_eq!(verdict.results[1].error_message.as_deref(), Some("Mount a volume."));
    assert_eq!(verdict.summary, "Need 3 replicas, found 2\n\n(1 more error(s))");
}

#[test]
fn verdicts_serialize_in_the_wire_shape() {
    let verdict = validate(&three_failing_rules(), "", 2);
    let wire = serde_json::to_value(&verdict).unwrap();
    assert_eq!(wire["passed"], json!(false));
    assert_eq!(wire["hintsUsed"], json!(2));
    assert_eq!(wire["nextHint"], json!("two"));
    assert_eq!(wire["results"][0], json!({ "type": "syntax", "passed": false, "errorMessage": "Declare a provider." }));

    let passing = serde_json::to_value(validate(&pod_exercise(), POD, 0)).unwrap();
    assert!(passing.get("nextHint").is_none());
    assert_eq!(passing["results"][0], json!({ "type": "syntax", "passed": true }));
}

#[test]
fn runaway_snippets_fail_only_their_own_rule() {
    let exercise: Exercise = serde_json::from_value(json!({
        "id": "runaway",
        "validations": [
            { "type": "intention", "check": { "custom": "(f => f(f))(f => f(f))" }, "errorMessage": "loop", "failMessage": "never shown" },
            { "type": "syntax", "check": { "contains": "kind" }, "errorMessage": "kind", "failMessage": "k" }
        ]
    }))
    .unwrap();

    let verdict = validate(&exercise, POD, 0);
    let message = verdict.results[0].error_message.as_deref().unwrap();
    assert!(message.starts_with("custom check failed:"), "{message}");
    assert!(verdict.results[1].passed);
    assert_eq!(verdict.failed_count(), 1);
}
