//! Authoring-time validation of checks.
//!
//! Finds the author errors that would otherwise surface only while grading:
//! regexes that do not compile and custom snippets that are denied or do not
//! parse. No submission is needed.

use std::fmt;

use crate::check::eval::compile_pattern;
use crate::check::CheckNode;
use crate::exercise::Exercise;
use crate::errors::DojoError;
use crate::script;

/// A lint error and where in the exercise it was found.
#[derive(Debug)]
pub struct LintFinding {
    pub location: String,
    pub error: DojoError,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Every author error in a check tree, in tree order.
pub fn lint(node: &CheckNode) -> Vec<DojoError> {
    let mut errors = Vec::new();
    lint_into(node, &mut errors);
    errors
}

fn lint_into(node: &CheckNode, errors: &mut Vec<DojoError>) {
    match node {
        CheckNode::Matches(pattern) | CheckNode::NotMatches(pattern) => {
            if let Err(e) = compile_pattern(pattern) {
                errors.push(e);
            }
        }
        CheckNode::Custom(snippet) => {
            if let Err(e) = script::compile(snippet) {
                errors.push(e);
            }
        }
        CheckNode::YamlItemsHave { fields, .. } if fields.is_empty() => {
            errors.push(crate::err_msg!(InvalidRule, "yamlItemsHave lists no fields"));
        }
        CheckNode::All(children) | CheckNode::Any(children) => {
            for child in children {
                lint_into(child, errors);
            }
        }
        CheckNode::Not(child) => lint_into(child, errors),
        _ => {}
    }
}

/// Lints every validation rule and terminal condition of an exercise.
pub fn lint_exercise(exercise: &Exercise) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    for (i, rule) in exercise.validations.iter().enumerate() {
        let location = format!("validations[{i}] ({})", rule.error_message);
        findings.extend(lint(&rule.check).into_iter().map(|error| LintFinding {
            location: location.clone(),
            error,
        }));
    }

    for (pattern, responses) in &exercise.terminal_commands {
        for (i, entry) in responses.iter().enumerate() {
            let Some(condition) = &entry.when else {
                continue;
            };
            let location = format!("terminalCommands[{pattern:?}][{i}].when");
            findings.extend(lint(condition).into_iter().map(|error| LintFinding {
                location: location.clone(),
                error,
            }));
        }
    }

    findings
}
