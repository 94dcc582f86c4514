mod common;

use common::{commands, pod_exercise, MALFORMED, POD};
use dojo::terminal::{route, CommandRouter, Route, TerminalResponse, COMMAND_NOT_FOUND_EXIT_CODE};

#[test]
fn earlier_prefix_pattern_wins_over_a_later_exact_one() {
    let exercise = commands(&[
        ("kubectl get pods", "default namespace"),
        ("kubectl get pods -n production", "production namespace"),
    ]);
    let router = CommandRouter::new(&exercise);
    assert_eq!(
        router.resolve("kubectl get pods -n production"),
        Route::Prefix("kubectl get pods")
    );
    assert_eq!(route(&exercise, "kubectl get pods -n production", "").output, "default namespace");
}

#[test]
fn declaration_order_breaks_prefix_ties() {
    let exercise = commands(&[
        ("kubectl get pods -n production", "production namespace"),
        ("kubectl get pods", "default namespace"),
    ]);
    assert_eq!(route(&exercise, "kubectl get pods -n production", "").output, "production namespace");
    // A shorter typed command is a prefix of the first pattern.
    assert_eq!(route(&exercise, "kubectl get", "").output, "production namespace");
}

#[test]
fn variable_arguments_reach_their_stem() {
    let exercise = pod_exercise();
    let response = route(&exercise, "  kubectl logs web-7d9f   ", POD);
    assert_eq!(response, TerminalResponse::new("listening on :80".into(), 0));
}

#[test]
fn responses_are_conditioned_on_the_submission() {
    let exercise = pod_exercise();
    assert_eq!(
        route(&exercise, "kubectl get pods", POD).output,
        "NAME   READY   STATUS\nweb    1/1     Running"
    );
    assert_eq!(
        route(&exercise, "kubectl get pods", "kind: Service").output,
        "No resources found in default namespace."
    );

    let failed = route(&exercise, "kubectl apply -f pod.yaml", MALFORMED);
    assert_eq!(failed, TerminalResponse::new("error: error parsing pod.yaml".into(), 1));
    assert_eq!(route(&exercise, "kubectl apply -f pod.yaml", POD).output, "pod/web created");
}

#[test]
fn help_lists_patterns_then_built_ins() {
    let exercise = pod_exercise();
    for typed in ["help", "?", " help "] {
        let response = route(&exercise, typed, "");
        assert_eq!(response.exit_code, 0);
        assert_eq!(
            response.output,
            "Available commands:\n  kubectl get pods\n  kubectl apply -f pod.yaml\n  kubectl logs\n  clear\n  help"
        );
    }
}

#[test]
fn clear_resets_the_screen() {
    let response = route(&pod_exercise(), "clear", POD);
    assert!(response.clear);
    assert!(response.output.is_empty());
    assert_eq!(response.exit_code, 0);

    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["clear"], serde_json::json!(true));
    let plain = serde_json::to_value(TerminalResponse::new("x".into(), 0)).unwrap();
    assert!(plain.get("clear").is_none());
}

#[test]
fn unknown_commands_are_not_found() {
    let response = route(&pod_exercise(), "helm install web ./chart", POD);
    assert_eq!(response.output, "helm: command not found");
    assert_eq!(response.exit_code, COMMAND_NOT_FOUND_EXIT_CODE);
    assert_eq!(COMMAND_NOT_FOUND_EXIT_CODE, 127);
}

#[test]
fn empty_input() {
    // Empty input is a prefix of every pattern.
    let exercise = pod_exercise();
    assert_eq!(CommandRouter::new(&exercise).resolve("   "), Route::Prefix("kubectl get pods"));

    let bare = commands(&[]);
    assert_eq!(CommandRouter::new(&bare).resolve(""), Route::Empty);
    assert_eq!(route(&bare, "", ""), TerminalResponse::default());
}

#[test]
fn registered_patterns_shadow_built_ins() {
    let exercise = commands(&[("help", "custom help"), ("clear", "not cleared")]);
    assert_eq!(route(&exercise, "help", "").output, "custom help");
    assert!(!route(&exercise, "clear", "").clear);
}

#[test]
fn broken_conditions_fall_through() {
    let exercise: dojo::Exercise = serde_json::from_str(
        r#"{
            "id": "broken-condition",
            "terminalCommands": {
                "terraform plan": [
                    { "when": { "matches": "(" }, "output": "never" },
                    { "when": { "custom": "return fetch('x')" }, "output": "never either" },
                    { "output": "No changes.", "exitCode": 0 }
                ]
            }
        }"#,
    )
    .unwrap();
    assert_eq!(route(&exercise, "terraform plan", "").output, "No changes.");
}
