//! Rule hydration: stored records to executable checks.
//!
//! A rule whose check is a lone custom snippet hands the snippet's verdict
//! straight back, own error message included. Every other rule runs the
//! check tree and, on failure, reports the rule's single `failMessage`,
//! whichever leaf failed.
//!
//! Terminal responses hydrate the same way: conditions are checks, and the
//! pure-custom shortcut applies to them too.

use serde::Serialize;
use tracing::{debug, warn};

use crate::check::{self, CheckNode};
use crate::errors::DojoError;
use crate::exercise::{TerminalResponseEntry, ValidationRule};
use crate::script;
use crate::terminal::TerminalResponse;

/// The result of running one rule against a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            error_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    PureCustom,
    Tree,
}

/// A validation rule ready to run.
#[derive(Debug, Clone, Copy)]
pub struct ExecutableRule<'a> {
    rule: &'a ValidationRule,
    mode: Mode,
}

impl<'a> ExecutableRule<'a> {
    pub fn hydrate(rule: &'a ValidationRule) -> Self {
        let mode = if rule.check.is_pure_custom() {
            Mode::PureCustom
        } else {
            Mode::Tree
        };
        Self { rule, mode }
    }

    pub fn rule(&self) -> &'a ValidationRule {
        self.rule
    }

    /// Runs the rule. `Err` means the rule itself is broken, not that the
    /// submission failed it.
    pub fn check(&self, source: &str) -> Result<RuleOutcome, DojoError> {
        match (self.mode, &self.rule.check) {
            (Mode::PureCustom, CheckNode::Custom(snippet)) => {
                let result = script::run_custom(snippet, source)?;
                let error_message = match result.error_message() {
                    Some(message) => Some(message.to_string()),
                    None if !result.passed() => Some(self.rule.fail_message.clone()),
                    None => None,
                };
                Ok(RuleOutcome {
                    passed: result.passed(),
                    error_message,
                })
            }
            (_, node) => {
                if check::evaluate(node, source)? {
                    return Ok(RuleOutcome::pass());
                }
                if tracing::enabled!(tracing::Level::DEBUG) {
                    if let Ok(Some(reason)) = check::explain(node, source) {
                        debug!(rule = %self.rule.error_message, %reason, "rule failed");
                    }
                }
                Ok(RuleOutcome::fail(self.rule.fail_message.clone()))
            }
        }
    }
}

/// Whether a terminal condition holds. Broken conditions never match.
pub fn condition_holds(condition: &CheckNode, source: &str) -> bool {
    let result = match condition {
        CheckNode::Custom(snippet) => script::run_custom(snippet, source).map(|r| r.passed()),
        node => check::evaluate(node, source),
    };
    result.unwrap_or_else(|e| {
        warn!(error = %e, condition = %condition, "terminal condition failed to evaluate");
        false
    })
}

/// A command's response list, ready to pick a response for a submission.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHandler<'a> {
    entries: &'a [TerminalResponseEntry],
}

impl<'a> ResponseHandler<'a> {
    pub fn hydrate(entries: &'a [TerminalResponseEntry]) -> Self {
        Self { entries }
    }

    /// The first entry that is unconditional or whose condition holds. With
    /// no such entry the response is empty with exit code 0.
    pub fn respond(&self, source: &str) -> TerminalResponse {
        self.entries
            .iter()
            .find(|entry| match &entry.when {
                None => true,
                Some(condition) => condition_holds(condition, source),
            })
            .map(|entry| TerminalResponse::new(entry.output.clone(), entry.exit_code))
            .unwrap_or_default()
    }
}
