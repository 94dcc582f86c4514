//! The check language.
//!
//! A check is a boolean tree evaluated against submitted source text. Leaves
//! test the raw text (`contains`, `matches`), the text parsed as a YAML
//! document (`yamlHas`, `yamlEquals`, ...) or run a custom snippet. `all`,
//! `any` and `not` combine them.
//!
//! Authored records use a flat object where any number of leaf fields may be
//! set at once, meaning "all of these". That shape lives in [`stored`] and is
//! normalized into [`CheckNode`] as it is deserialized, so the rest of the
//! engine only ever sees the explicit tree.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod eval;
pub mod explain;
pub mod lint;
pub mod stored;

pub use eval::evaluate;
pub use explain::explain;
pub use lint::{lint, lint_exercise, LintFinding};
pub use stored::StoredCheck;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCheck", into = "StoredCheck")]
pub enum CheckNode {
    Contains(String),
    NotContains(String),
    Matches(String),
    NotMatches(String),
    YamlValid,
    YamlHas(String),
    YamlNotHas(String),
    YamlIsArray(String),
    YamlEquals { path: String, value: serde_json::Value },
    YamlItemsHave { path: String, fields: Vec<String> },
    Custom(String),
    All(Vec<CheckNode>),
    Any(Vec<CheckNode>),
    Not(Box<CheckNode>),
}

impl CheckNode {
    /// The check that always passes: a node with nothing to test.
    pub fn vacuous() -> Self {
        CheckNode::All(Vec::new())
    }

    /// True when the node is a lone custom snippet, whose own result becomes
    /// the rule's verdict.
    pub fn is_pure_custom(&self) -> bool {
        matches!(self, CheckNode::Custom(_))
    }
}

impl fmt::Display for CheckNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckNode::Contains(text) => write!(f, "contains {text:?}"),
            CheckNode::NotContains(text) => write!(f, "notContains {text:?}"),
            CheckNode::Matches(pattern) => write!(f, "matches /{pattern}/"),
            CheckNode::NotMatches(pattern) => write!(f, "notMatches /{pattern}/"),
            CheckNode::YamlValid => write!(f, "yamlValid"),
            CheckNode::YamlHas(path) => write!(f, "yamlHas {path:?}"),
            CheckNode::YamlNotHas(path) => write!(f, "yamlNotHas {path:?}"),
            CheckNode::YamlIsArray(path) => write!(f, "yamlIsArray {path:?}"),
            CheckNode::YamlEquals { path, value } => write!(f, "yamlEquals {path:?} == {value}"),
            CheckNode::YamlItemsHave { path, fields } => {
                write!(f, "yamlItemsHave {path:?} [{}]", fields.join(", "))
            }
            CheckNode::Custom(_) => write!(f, "custom"),
            CheckNode::All(children) => write!(f, "all ({} checks)", children.len()),
            CheckNode::Any(children) => write!(f, "any ({} checks)", children.len()),
            CheckNode::Not(child) => write!(f, "not ({child})"),
        }
    }
}
