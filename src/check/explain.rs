//! Names the leaf that made a check fail.
//!
//! A failing rule always reports its single authored `failMessage`. This is
//! the extra detail for authors: the CLI prints it and the rule hydrator logs
//! it at debug level.

use crate::check::eval::{evaluate_in, Submission};
use crate::check::CheckNode;
use crate::errors::DojoError;
use crate::script;

/// Describes the first failing leaf, or returns `None` if the check passes.
pub fn explain(node: &CheckNode, source: &str) -> Result<Option<String>, DojoError> {
    explain_in(node, &Submission::new(source))
}

fn explain_in(node: &CheckNode, submission: &Submission) -> Result<Option<String>, DojoError> {
    match node {
        CheckNode::All(children) => {
            for child in children {
                if let Some(reason) = explain_in(child, submission)? {
                    return Ok(Some(reason));
                }
            }
            Ok(None)
        }
        CheckNode::Any(children) => {
            let mut reasons = Vec::with_capacity(children.len());
            for child in children {
                match explain_in(child, submission)? {
                    None => return Ok(None),
                    Some(reason) => reasons.push(reason),
                }
            }
            Ok(Some(if reasons.is_empty() {
                "any: no alternatives to satisfy".to_string()
            } else {
                format!("any: none passed ({})", reasons.join("; "))
            }))
        }
        CheckNode::Not(child) => Ok(evaluate_in(child, submission)?.then(|| format!("{node} passed"))),
        CheckNode::Custom(snippet) => {
            let result = script::run_custom(snippet, submission.text())?;
            Ok((!result.passed()).then(|| match result.error_message() {
                Some(message) => format!("custom: {message}"),
                None => "custom: returned false".to_string(),
            }))
        }
        CheckNode::YamlValid => Ok((!evaluate_in(node, submission)?).then(|| {
            "yamlValid: submission is not a YAML document".to_string()
        })),
        leaf => {
            if evaluate_in(leaf, submission)? {
                return Ok(None);
            }
            let unparsable = is_document_leaf(leaf) && submission.document().is_none();
            Ok(Some(if unparsable {
                format!("{leaf} (submission is not a YAML document)")
            } else {
                leaf.to_string()
            }))
        }
    }
}

fn is_document_leaf(node: &CheckNode) -> bool {
    matches!(
        node,
        CheckNode::YamlHas(_)
            | CheckNode::YamlNotHas(_)
            | CheckNode::YamlIsArray(_)
            | CheckNode::YamlEquals { .. }
            | CheckNode::YamlItemsHave { .. }
    )
}
