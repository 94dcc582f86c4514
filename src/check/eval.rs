//! Check evaluation.
//!
//! `evaluate` never fails because the submission is malformed: each YAML
//! leaf decides for itself what an unparsable document means (see
//! [`Submission::on_document`]). It does fail on author errors, namely an
//! invalid regex or a custom snippet that is denied or does not parse.

use once_cell::unsync::OnceCell;
use regex::Regex;
use serde_yaml::Value as YamlValue;

use crate::check::CheckNode;
use crate::document::{field, parse_document, query_path};
use crate::errors::DojoError;
use crate::script;

/// Submitted text plus its YAML parse, computed at most once per evaluation.
pub struct Submission<'a> {
    text: &'a str,
    document: OnceCell<Option<YamlValue>>,
}

impl<'a> Submission<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            document: OnceCell::new(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The parsed document, or `None` if the text is not valid YAML.
    pub fn document(&self) -> Option<&YamlValue> {
        self.document
            .get_or_init(|| match parse_document(self.text) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::trace!(error = %e, "submission is not a YAML document");
                    None
                }
            })
            .as_ref()
    }

    /// Applies `test` to the parsed document, or answers `on_parse_error`.
    pub fn on_document(&self, on_parse_error: bool, test: impl FnOnce(&YamlValue) -> bool) -> bool {
        self.document().map_or(on_parse_error, test)
    }
}

/// Evaluates a check against submitted text.
pub fn evaluate(node: &CheckNode, source: &str) -> Result<bool, DojoError> {
    evaluate_in(node, &Submission::new(source))
}

pub fn evaluate_in(node: &CheckNode, submission: &Submission) -> Result<bool, DojoError> {
    let passed = match node {
        CheckNode::Contains(text) => submission.text().contains(text.as_str()),
        CheckNode::NotContains(text) => !submission.text().contains(text.as_str()),
        CheckNode::Matches(pattern) => compile_pattern(pattern)?.is_match(submission.text()),
        CheckNode::NotMatches(pattern) => !compile_pattern(pattern)?.is_match(submission.text()),
        CheckNode::YamlValid => submission.document().is_some(),
        CheckNode::YamlHas(path) => submission.on_document(false, |doc| query_path(doc, path).is_some()),
        // Absence is vacuously satisfied when there is no document at all.
        CheckNode::YamlNotHas(path) => submission.on_document(true, |doc| query_path(doc, path).is_none()),
        CheckNode::YamlIsArray(path) => submission.on_document(false, |doc| {
            matches!(query_path(doc, path), Some(YamlValue::Sequence(_)))
        }),
        CheckNode::YamlEquals { path, value } => submission.on_document(false, |doc| {
            query_path(doc, path).is_some_and(|actual| scalar_equals(actual, value))
        }),
        CheckNode::YamlItemsHave { path, fields } => submission.on_document(false, |doc| {
            match query_path(doc, path) {
                Some(YamlValue::Sequence(items)) => items
                    .iter()
                    .all(|item| fields.iter().all(|name| field(item, name).is_some())),
                _ => false,
            }
        }),
        CheckNode::Custom(snippet) => script::run_custom(snippet, submission.text())?.passed(),
        CheckNode::All(children) => {
            for child in children {
                if !evaluate_in(child, submission)? {
                    return Ok(false);
                }
            }
            true
        }
        CheckNode::Any(children) => {
            for child in children {
                if evaluate_in(child, submission)? {
                    return Ok(true);
                }
            }
            false
        }
        CheckNode::Not(child) => !evaluate_in(child, submission)?,
    };
    Ok(passed)
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, DojoError> {
    Regex::new(pattern).map_err(|e| DojoError::invalid_pattern(pattern, e))
}

/// Strict equality between a document value and an authored literal. Only
/// scalars can be equal; sequences and mappings never are.
pub fn scalar_equals(actual: &YamlValue, expected: &serde_json::Value) -> bool {
    use serde_json::Value as JsonValue;

    match (actual, expected) {
        (YamlValue::Null, JsonValue::Null) => true,
        (YamlValue::Bool(a), JsonValue::Bool(b)) => a == b,
        (YamlValue::String(a), JsonValue::String(b)) => a == b,
        (YamlValue::Number(a), JsonValue::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (YamlValue::Tagged(tagged), _) => scalar_equals(&tagged.value, expected),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ErrorType;

    const MALFORMED: &str = "spec: [unclosed\n  replicas: 3";

    fn eval(node: &CheckNode, source: &str) -> bool {
        evaluate(node, source).unwrap()
    }

    #[test]
    fn malformed_documents_follow_per_leaf_policy() {
        let path = || "spec.replicas".to_string();
        assert!(!eval(&CheckNode::YamlValid, MALFORMED));
        assert!(!eval(&CheckNode::YamlHas(path()), MALFORMED));
        assert!(eval(&CheckNode::YamlNotHas(path()), MALFORMED));
        assert!(!eval(&CheckNode::YamlIsArray(path()), MALFORMED));
        assert!(!eval(
            &CheckNode::YamlEquals {
                path: path(),
                value: json!(3)
            },
            MALFORMED
        ));
        assert!(!eval(
            &CheckNode::YamlItemsHave {
                path: path(),
                fields: vec![]
            },
            MALFORMED
        ));
    }

    #[test]
    fn yaml_equals_is_strict() {
        let source = "replicas: 3\nimage: nginx\nenabled: true\nport: \"80\"\nlist: [1]";
        let equals = |path: &str, value| CheckNode::YamlEquals {
            path: path.into(),
            value,
        };
        assert!(eval(&equals("replicas", json!(3)), source));
        assert!(eval(&equals("replicas", json!(3.0)), source));
        assert!(!eval(&equals("replicas", json!("3")), source));
        assert!(eval(&equals("enabled", json!(true)), source));
        assert!(!eval(&equals("port", json!(80)), source));
        assert!(!eval(&equals("list", json!([1])), source));
        assert!(!eval(&equals("missing", json!(null)), source));
    }

    #[test]
    fn null_values_count_as_present() {
        assert!(eval(&CheckNode::YamlHas("spec".into()), "spec: ~"));
        assert!(!eval(&CheckNode::YamlNotHas("spec".into()), "spec: ~"));
    }

    #[test]
    fn items_have_requires_a_sequence() {
        let node = CheckNode::YamlItemsHave {
            path: "items".into(),
            fields: vec!["name".into()],
        };
        assert!(eval(&node, "items: []"));
        assert!(!eval(&node, "items: {name: x}"));
        assert!(!eval(&node, "items: [a, b]"));
        assert!(eval(&node, "items:\n  - name: a\n  - name: ~"));
    }

    #[test]
    fn invalid_regex_propagates() {
        let err = evaluate(&CheckNode::Matches("(".into()), "anything").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Pattern);
        let err = evaluate(&CheckNode::NotMatches("[a-".into()), "anything").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Pattern);
    }

    #[test]
    fn combinators_short_circuit() {
        // The invalid pattern is never reached.
        let node = CheckNode::Any(vec![CheckNode::Contains("a".into()), CheckNode::Matches("(".into())]);
        assert!(eval(&node, "abc"));
        let node = CheckNode::All(vec![CheckNode::Contains("z".into()), CheckNode::Matches("(".into())]);
        assert!(!eval(&node, "abc"));
        assert!(eval(&CheckNode::Not(Box::new(CheckNode::Contains("z".into()))), "abc"));
    }

    #[test]
    fn custom_leaves_use_the_snippet_verdict() {
        let node = CheckNode::Custom("return yaml.load(code).kind === 'Pod'".into());
        assert!(eval(&node, "kind: Pod"));
        assert!(!eval(&node, "kind: Service"));
        assert!(!eval(&node, "kind: [oops"));
    }

    #[test]
    fn submission_parses_once() {
        let submission = Submission::new("a: 1");
        let first = submission.document().map(|doc| doc as *const YamlValue);
        let second = submission.document().map(|doc| doc as *const YamlValue);
        assert_eq!(first, second);
    }
}
