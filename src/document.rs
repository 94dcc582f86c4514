//! Structured-document access for YAML checks.
//!
//! Submitted code is parsed with `serde_yaml` into a value tree, and leaves
//! query it with dot-separated paths such as `spec.containers.0.image`. A
//! segment that parses as an integer indexes into a sequence; any other
//! segment is a mapping key. A missing key, an out-of-range index or a type
//! mismatch yields "undefined" (`None`), never an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value as YamlValue};

/// Parses source text as a single YAML document.
pub fn parse_document(text: &str) -> Result<YamlValue, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// A canonical, dot-separated path into a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(pub Vec<String>);

impl Path {
    pub fn parse(path: &str) -> Self {
        Path(path.split('.').map(String::from).collect())
    }

    /// Walks the document, halting at the first segment that does not resolve.
    pub fn resolve<'a>(&self, doc: &'a YamlValue) -> Option<&'a YamlValue> {
        self.0
            .iter()
            .try_fold(untag(doc), |current, segment| step(current, segment).map(untag))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Resolves a dot-path against a document.
pub fn query_path<'a>(doc: &'a YamlValue, path: &str) -> Option<&'a YamlValue> {
    Path::parse(path).resolve(doc)
}

/// Looks up a single field of a mapping node.
pub fn field<'a>(node: &'a YamlValue, name: &str) -> Option<&'a YamlValue> {
    match untag(node) {
        YamlValue::Mapping(map) => lookup_key(map, name).map(untag),
        _ => None,
    }
}

/// Property-name form of a mapping key; composite keys have none.
pub fn key_string(key: &YamlValue) -> Option<String> {
    match untag(key) {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Null => Some("null".to_string()),
        _ => None,
    }
}

fn step<'a>(current: &'a YamlValue, segment: &str) -> Option<&'a YamlValue> {
    match current {
        YamlValue::Sequence(items) => {
            let index = segment.parse::<i64>().ok()?;
            usize::try_from(index).ok().and_then(|i| items.get(i))
        }
        YamlValue::Mapping(map) => lookup_key(map, segment),
        _ => None,
    }
}

// Integer-looking segments still address mappings: YAML keys such as `200:`
// parse as numbers but are matched by their string form.
fn lookup_key<'a>(map: &'a Mapping, key: &str) -> Option<&'a YamlValue> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| !k.is_string() && key_string(k).as_deref() == Some(key))
            .map(|(_, v)| v)
    })
}

fn untag(value: &YamlValue) -> &YamlValue {
    let mut current = value;
    while let YamlValue::Tagged(tagged) = current {
        current = &tagged.value;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    const POD: &str = "\
apiVersion: v1
kind: Pod
spec:
  replicas: 3
  containers:
    - name: app
      image: nginx
    - name: sidecar
responses:
  200: ok
";

    fn doc() -> YamlValue {
        parse_document(POD).unwrap()
    }

    #[test]
    fn resolves_keys_and_indices() {
        let doc = doc();
        assert_eq!(query_path(&doc, "kind").and_then(|v| v.as_str()), Some("Pod"));
        assert_eq!(
            query_path(&doc, "spec.containers.0.image").and_then(|v| v.as_str()),
            Some("nginx")
        );
        assert_eq!(query_path(&doc, "spec.replicas").and_then(|v| v.as_u64()), Some(3));
    }

    #[test]
    fn missing_segments_are_undefined() {
        let doc = doc();
        assert!(query_path(&doc, "spec.volumes").is_none());
        assert!(query_path(&doc, "spec.containers.5").is_none());
        assert!(query_path(&doc, "spec.containers.-1").is_none());
        assert!(query_path(&doc, "spec.containers.first").is_none());
        // Descending through a scalar halts.
        assert!(query_path(&doc, "kind.length").is_none());
        assert!(query_path(&doc, "spec.containers.1.image").is_none());
    }

    #[test]
    fn numeric_mapping_keys_match_by_string_form() {
        let doc = doc();
        assert_eq!(query_path(&doc, "responses.200").and_then(|v| v.as_str()), Some("ok"));
    }

    #[test]
    fn path_round_trips_through_display() {
        let path = Path::parse("spec.containers.0");
        assert_eq!(path.0.len(), 3);
        assert_eq!(path.to_string(), "spec.containers.0");
    }

    #[test]
    fn malformed_text_fails_to_parse() {
        assert!(parse_document("spec: [unclosed").is_err());
        assert!(parse_document("a: 1\n---\nb: 2").is_err());
    }
}
