//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use dojo::{Exercise, InMemoryStore, TerminalResponseEntry};

pub const POD: &str = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  replicas: 2
  containers:
    - name: app
      image: nginx:1.25
    - name: sidecar
      image: envoy:v1.29
";

pub const MALFORMED: &str = "spec: [unclosed\n  replicas: 3";

/// A pod exercise with one rule per kind, three hints and a few terminal
/// commands. Kept as text so command order is the file's order.
pub const POD_EXERCISE: &str = r#"{
    "id": "pod-basics",
    "validations": [
        {
            "type": "syntax",
            "check": { "yamlValid": true },
            "errorMessage": "yaml-valid",
            "failMessage": "Your manifest is not valid YAML."
        },
        {
            "type": "semantic",
            "check": { "yamlEquals": { "path": "kind", "value": "Pod" } },
            "errorMessage": "kind-pod",
            "failMessage": "The resource kind must be Pod."
        },
        {
            "type": "intention",
            "check": { "yamlItemsHave": { "path": "spec.containers", "fields": ["name", "image"] } },
            "errorMessage": "containers-complete",
            "failMessage": "Every container needs a name and an image."
        }
    ],
    "terminalCommands": {
        "kubectl get pods": [
            { "when": { "contains": "kind: Pod" }, "output": "NAME   READY   STATUS\nweb    1/1     Running" },
            { "output": "No resources found in default namespace." }
        ],
        "kubectl apply -f pod.yaml": [
            { "when": { "not": { "yamlValid": true } }, "output": "error: error parsing pod.yaml", "exitCode": 1 },
            { "output": "pod/web created" }
        ],
        "kubectl logs": [
            { "output": "listening on :80" }
        ]
    },
    "hints": [
        "Start with apiVersion and kind.",
        "Containers live under spec.containers.",
        "Each container needs both name and image."
    ],
    "successMessage": "Pod manifest looks good!"
}"#;

pub const THREE_FAILURES: &str = r#"{
    "id": "three-failures",
    "validations": [
        { "type": "syntax", "check": { "contains": "provider" }, "errorMessage": "a", "failMessage": "Declare a provider." },
        { "type": "semantic", "check": { "contains": "resource" }, "errorMessage": "b", "failMessage": "Declare a resource." },
        { "type": "intention", "check": { "matches": "region\\s*=" }, "errorMessage": "c", "failMessage": "Set a region." }
    ],
    "hints": ["one", "two", "three"],
    "successMessage": "All set."
}"#;

pub fn pod_exercise() -> Exercise {
    serde_json::from_str(POD_EXERCISE).expect("pod exercise fixture is valid")
}

pub fn three_failing_rules() -> Exercise {
    serde_json::from_str(THREE_FAILURES).expect("three-failure fixture is valid")
}

pub fn store() -> InMemoryStore {
    [pod_exercise(), three_failing_rules()].into_iter().collect()
}

/// An exercise that only has unconditional terminal commands, in the given
/// order.
pub fn commands(patterns: &[(&str, &str)]) -> Exercise {
    Exercise {
        id: "terminal".to_string(),
        validations: Vec::new(),
        terminal_commands: patterns
            .iter()
            .map(|(pattern, output)| {
                let entry = TerminalResponseEntry {
                    when: None,
                    output: output.to_string(),
                    exit_code: 0,
                };
                (pattern.to_string(), vec![entry])
            })
            .collect(),
        hints: Vec::new(),
        success_message: String::new(),
    }
}
