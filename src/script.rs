//! Custom check snippets.
//!
//! A `custom` check carries a short program in a small JavaScript-flavoured
//! language. Snippets are screened against a fixed denylist, parsed with
//! `pest` and run by a tree-walking interpreter whose only names are `code`
//! (the submitted text) and the atoms in [`atoms::STANDARD_ATOMS`].
//!
//! ```text
//! const doc = yaml.load(code);
//! if (!doc.spec) return { passed: false, errorMessage: "spec is missing" };
//! return doc.spec.containers.every(c => c.image && !c.image.endsWith(":latest"));
//! ```
//!
//! Failures split two ways. A snippet that is denied or does not parse is an
//! author error and comes back as `Err`. A snippet that fails while running
//! against a submission is a failing verdict.

use serde::Serialize;

use crate::errors::{to_error_source, DojoError};
use crate::script::ast::Program;
use crate::script::atoms::STANDARD_ATOMS;
use crate::script::eval::{EvaluationContext, DEFAULT_MAX_DEPTH};
use crate::script::value::Value;

pub mod ast;
pub mod atoms;
pub mod denylist;
pub mod eval;
pub mod parser;
pub mod value;

/// What a snippet returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CustomResult {
    /// A bare boolean, or any other value reduced to its truthiness.
    Flag(bool),
    /// An object with a `passed` key, optionally explaining the failure.
    Verdict {
        passed: bool,
        #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
    },
}

impl CustomResult {
    pub fn passed(&self) -> bool {
        match self {
            CustomResult::Flag(passed) | CustomResult::Verdict { passed, .. } => *passed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CustomResult::Verdict { error_message, .. } => error_message.as_deref(),
            CustomResult::Flag(_) => None,
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(passed) => CustomResult::Flag(*passed),
            Value::Map(map) if map.contains_key("passed") => CustomResult::Verdict {
                passed: map.get("passed").is_some_and(Value::is_truthy),
                error_message: map
                    .get("errorMessage")
                    .filter(|message| !message.is_nullish())
                    .map(ToString::to_string),
            },
            other => CustomResult::Flag(other.is_truthy()),
        }
    }
}

/// Screens and parses a snippet without running it.
pub fn compile(snippet: &str) -> Result<Program, DojoError> {
    denylist::screen(snippet, &to_error_source("custom check", snippet))?;
    parser::parse(snippet)
}

/// Runs a snippet against submitted source text.
pub fn run_custom(snippet: &str, source_text: &str) -> Result<CustomResult, DojoError> {
    run_custom_with_depth(snippet, source_text, DEFAULT_MAX_DEPTH)
}

pub fn run_custom_with_depth(
    snippet: &str,
    source_text: &str,
    max_depth: usize,
) -> Result<CustomResult, DojoError> {
    let program = compile(snippet)?;
    Ok(execute(&program, source_text, max_depth))
}

/// Runs an already compiled program. Runtime errors become failing verdicts.
pub fn execute(program: &Program, source_text: &str, max_depth: usize) -> CustomResult {
    let mut env = STANDARD_ATOMS.bindings();
    env.insert("code".to_string(), Value::String(source_text.to_string()));

    let mut context =
        EvaluationContext::new(&STANDARD_ATOMS, program.source.clone(), env).with_max_depth(max_depth);

    match eval::run_program(program, &mut context) {
        Ok(value) => CustomResult::from_value(&value),
        Err(e) => {
            tracing::debug!(error = %e, "custom check raised");
            CustomResult::Verdict {
                passed: false,
                error_message: Some(format!("custom check failed: {}", e.message())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorType;

    #[test]
    fn boolean_results_are_flags() {
        assert_eq!(run_custom("code.includes('aws')", "provider aws").unwrap(), CustomResult::Flag(true));
        assert_eq!(run_custom("return false", "").unwrap(), CustomResult::Flag(false));
    }

    #[test]
    fn objects_with_passed_are_verdicts() {
        let result = run_custom("({ passed: 0, errorMessage: 'nope' })", "").unwrap();
        assert_eq!(
            result,
            CustomResult::Verdict {
                passed: false,
                error_message: Some("nope".into())
            }
        );
        let result = run_custom("return { passed: true }", "").unwrap();
        assert!(result.passed());
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn other_values_reduce_to_truthiness() {
        assert_eq!(run_custom("code.length", "abc").unwrap(), CustomResult::Flag(true));
        assert_eq!(run_custom("code.match(/x/)", "abc").unwrap(), CustomResult::Flag(false));
        assert_eq!(run_custom("const a = 1;", "").unwrap(), CustomResult::Flag(false));
    }

    #[test]
    fn runtime_errors_fail_with_message() {
        let result = run_custom("return yaml.load(code).spec.replicas > 1", "kind: Pod").unwrap();
        assert!(!result.passed());
        let message = result.error_message().unwrap();
        assert!(message.starts_with("custom check failed: "), "{message}");
        assert!(message.contains("replicas"), "{message}");
    }

    #[test]
    fn author_errors_are_errors() {
        assert_eq!(run_custom("return (", "").unwrap_err().error_type(), ErrorType::Parse);
        assert_eq!(run_custom("return process.env", "").unwrap_err().error_type(), ErrorType::Denied);
    }

    #[test]
    fn depth_limit_fails_the_snippet() {
        let snippet = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert!(run_custom_with_depth(&snippet, "", 1000).unwrap().passed());
        let result = run_custom_with_depth("!!!!!!!!!!true", "", 4).unwrap();
        assert!(!result.passed());
        assert!(result.error_message().unwrap().contains("Recursion limit"));
    }

    #[test]
    fn self_application_fails_the_snippet() {
        let result = run_custom("(f => f(f))(f => f(f))", "").unwrap();
        assert!(!result.passed());
        let message = result.error_message().unwrap();
        assert!(message.starts_with("custom check failed:"), "{message}");
        assert!(message.contains("Maximum call depth exceeded"), "{message}");
    }

    #[test]
    fn call_depth_is_per_call_in_flight() {
        let snippet = "const twice = g => x => g(g(x)); return [1, 2, 3].map(n => twice(m => m + 1)(n)).join(',')";
        assert_eq!(run_custom(snippet, "").unwrap(), CustomResult::Flag(true));

        let program = compile("(f => f(f))(f => f(f))").unwrap();
        let mut env = STANDARD_ATOMS.bindings();
        env.insert("code".to_string(), Value::String(String::new()));
        let mut context = EvaluationContext::new(&STANDARD_ATOMS, program.source.clone(), env).with_max_call_depth(3);
        let err = eval::run_program(&program, &mut context).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Eval);
        assert_eq!(context.call_depth, 0);
    }
}
