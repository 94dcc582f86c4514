//! Validation orchestration: grading a submission against every rule.
//!
//! All rules run, in declared order, even after one fails. A rule that is
//! itself broken (an invalid regex, a snippet that does not parse) fails
//! with an internal diagnostic and does not stop the others.

use serde::Serialize;
use tracing::{debug, warn};

use crate::exercise::{Exercise, RuleKind};
use crate::rules::{ExecutableRule, RuleOutcome};

/// One rule's line in a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The outcome of one validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub passed: bool,
    pub results: Vec<RuleResult>,
    pub summary: String,
    pub hints_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hint: Option<String>,
}

impl ValidationVerdict {
    /// The verdict for an exercise that does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            results: Vec::new(),
            summary: message.into(),
            hints_used: 0,
            next_hint: None,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }
}

/// Grades `source` against every rule of `exercise`. `failure_count` is how
/// many attempts the learner has already failed; it only drives hints.
pub fn validate(exercise: &Exercise, source: &str, failure_count: u32) -> ValidationVerdict {
    let results: Vec<RuleResult> = exercise
        .validations
        .iter()
        .map(ExecutableRule::hydrate)
        .map(|rule| run_rule(rule, source))
        .collect();

    let failures: Vec<&RuleResult> = results.iter().filter(|r| !r.passed).collect();
    let passed = failures.is_empty();
    let summary = match failures.as_slice() {
        [] => exercise.success_message.clone(),
        [first] => first_message(first),
        [first, rest @ ..] => format!("{}\n\n({} more error(s))", first_message(first), rest.len()),
    };

    let (hints_used, next_hint) = match reveal_hint(&exercise.hints, passed, failure_count) {
        Some(index) => (index + 1, Some(exercise.hints[index].clone())),
        None => (0, None),
    };

    debug!(
        exercise = %exercise.id,
        passed,
        failed = failures.len(),
        hints_used,
        "validated submission"
    );

    ValidationVerdict {
        passed,
        results,
        summary,
        hints_used,
        next_hint,
    }
}

fn run_rule(rule: ExecutableRule, source: &str) -> RuleResult {
    let kind = rule.rule().kind;
    let outcome = rule.check(source).unwrap_or_else(|e| {
        warn!(
            rule = %rule.rule().error_message,
            error = %e,
            "rule raised; reporting internal validation error"
        );
        RuleOutcome::fail(format!("internal validation error: {}", rule.rule().error_message))
    });
    RuleResult {
        kind,
        passed: outcome.passed,
        error_message: outcome.error_message,
    }
}

fn first_message(result: &RuleResult) -> String {
    result.error_message.clone().unwrap_or_default()
}

/// Which hint to reveal, if any: `min(failure_count / 2, hints.len() - 1)`,
/// and only for a failed attempt after at least two earlier failures.
pub fn reveal_hint(hints: &[String], passed: bool, failure_count: u32) -> Option<usize> {
    if passed || failure_count < 2 || hints.is_empty() {
        return None;
    }
    Some((failure_count as usize / 2).min(hints.len() - 1))
}
