//! The authored check shape and its normalization.

use serde::{Deserialize, Serialize};

use crate::check::CheckNode;

/// A check as it appears in exercise records: every field optional, all
/// populated fields combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_has: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_not_has: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_is_array: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_equals: Option<YamlEqualsCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_items_have: Option<YamlItemsHaveCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<CheckNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<CheckNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<CheckNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YamlEqualsCheck {
    pub path: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YamlItemsHaveCheck {
    pub path: String,
    pub fields: Vec<String>,
}

impl StoredCheck {
    /// Populated fields as nodes, in evaluation order.
    pub fn into_nodes(self) -> Vec<CheckNode> {
        let mut nodes = Vec::new();
        nodes.extend(self.contains.map(CheckNode::Contains));
        nodes.extend(self.not_contains.map(CheckNode::NotContains));
        nodes.extend(self.matches.map(CheckNode::Matches));
        nodes.extend(self.not_matches.map(CheckNode::NotMatches));
        if self.yaml_valid == Some(true) {
            nodes.push(CheckNode::YamlValid);
        }
        nodes.extend(self.yaml_has.map(CheckNode::YamlHas));
        nodes.extend(self.yaml_not_has.map(CheckNode::YamlNotHas));
        nodes.extend(self.yaml_is_array.map(CheckNode::YamlIsArray));
        nodes.extend(
            self.yaml_equals
                .map(|YamlEqualsCheck { path, value }| CheckNode::YamlEquals { path, value }),
        );
        nodes.extend(
            self.yaml_items_have
                .map(|YamlItemsHaveCheck { path, fields }| CheckNode::YamlItemsHave { path, fields }),
        );
        nodes.extend(self.custom.map(CheckNode::Custom));
        nodes.extend(self.all.map(CheckNode::All));
        nodes.extend(self.any.map(CheckNode::Any));
        nodes.extend(self.not.map(CheckNode::Not));
        nodes
    }
}

impl From<StoredCheck> for CheckNode {
    fn from(stored: StoredCheck) -> Self {
        let mut nodes = stored.into_nodes();
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            CheckNode::All(nodes)
        }
    }
}

impl From<CheckNode> for StoredCheck {
    fn from(node: CheckNode) -> Self {
        let mut stored = StoredCheck::default();
        match node {
            CheckNode::Contains(text) => stored.contains = Some(text),
            CheckNode::NotContains(text) => stored.not_contains = Some(text),
            CheckNode::Matches(pattern) => stored.matches = Some(pattern),
            CheckNode::NotMatches(pattern) => stored.not_matches = Some(pattern),
            CheckNode::YamlValid => stored.yaml_valid = Some(true),
            CheckNode::YamlHas(path) => stored.yaml_has = Some(path),
            CheckNode::YamlNotHas(path) => stored.yaml_not_has = Some(path),
            CheckNode::YamlIsArray(path) => stored.yaml_is_array = Some(path),
            CheckNode::YamlEquals { path, value } => stored.yaml_equals = Some(YamlEqualsCheck { path, value }),
            CheckNode::YamlItemsHave { path, fields } => {
                stored.yaml_items_have = Some(YamlItemsHaveCheck { path, fields })
            }
            CheckNode::Custom(snippet) => stored.custom = Some(snippet),
            // The vacuous node is stored as an empty object.
            CheckNode::All(children) if children.is_empty() => {}
            CheckNode::All(children) => stored.all = Some(children),
            CheckNode::Any(children) => stored.any = Some(children),
            CheckNode::Not(child) => stored.not = Some(child),
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(value: serde_json::Value) -> CheckNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_object_is_vacuous() {
        assert_eq!(node(json!({})), CheckNode::vacuous());
        assert_eq!(node(json!({ "yamlValid": false })), CheckNode::vacuous());
    }

    #[test]
    fn single_field_becomes_its_variant() {
        assert_eq!(node(json!({ "contains": "provider" })), CheckNode::Contains("provider".into()));
        assert_eq!(node(json!({ "yamlValid": true })), CheckNode::YamlValid);
        assert!(node(json!({ "custom": "return true" })).is_pure_custom());
    }

    #[test]
    fn several_fields_become_all_in_field_order() {
        let parsed = node(json!({
            "custom": "return true",
            "yamlHas": "spec",
            "contains": "kind",
        }));
        assert_eq!(
            parsed,
            CheckNode::All(vec![
                CheckNode::Contains("kind".into()),
                CheckNode::YamlHas("spec".into()),
                CheckNode::Custom("return true".into()),
            ])
        );
        assert!(!parsed.is_pure_custom());
    }

    #[test]
    fn nested_combinators_normalize_recursively() {
        let parsed = node(json!({
            "any": [{ "contains": "a" }, { "not": { "yamlIsArray": "items" } }],
        }));
        assert_eq!(
            parsed,
            CheckNode::Any(vec![
                CheckNode::Contains("a".into()),
                CheckNode::Not(Box::new(CheckNode::YamlIsArray("items".into()))),
            ])
        );
    }

    #[test]
    fn serializes_back_to_stored_shape() {
        let original = json!({
            "all": [
                { "yamlEquals": { "path": "kind", "value": "Pod" } },
                { "yamlItemsHave": { "path": "spec.containers", "fields": ["name", "image"] } },
            ],
        });
        let parsed = node(original.clone());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), original);
        assert_eq!(serde_json::to_value(CheckNode::vacuous()).unwrap(), json!({}));
    }

    #[test]
    fn yaml_records_deserialize_too() {
        let parsed: CheckNode = serde_yaml::from_str("yamlHas: spec.replicas\nnotContains: latest\n").unwrap();
        assert_eq!(
            parsed,
            CheckNode::All(vec![
                CheckNode::NotContains("latest".into()),
                CheckNode::YamlHas("spec.replicas".into()),
            ])
        );
    }
}
