//! # Document Atoms
//!
//! Snippet access to the YAML document parser and the dot-path query helper.
//!
//! - **`yaml.load(text)`** / **`yaml.parse(text)`** / **`parseYaml(text)`**:
//!   parse text into objects and arrays. Malformed text is a runtime error.
//! - **`getPath(target, "a.b.0")`**: dot-path lookup. `target` is a parsed
//!   value, or source text that is parsed first (malformed text yields
//!   `undefined`).

use crate::document::{parse_document, Path};
use crate::script::atoms::{arg, AtomRegistry, Global};
use crate::script::value::{Native, NativeFn, Value};

const YAML_NAMESPACE: &[Native] = &[
    Native {
        name: "load",
        func: ATOM_PARSE_YAML,
    },
    Native {
        name: "parse",
        func: ATOM_PARSE_YAML,
    },
];

pub fn register(registry: &mut AtomRegistry) {
    registry.register_global("yaml", Global::Namespace(YAML_NAMESPACE));
    registry.register_global(
        "parseYaml",
        Global::Function(Native {
            name: "parseYaml",
            func: ATOM_PARSE_YAML,
        }),
    );
    registry.register_global(
        "getPath",
        Global::Function(Native {
            name: "getPath",
            func: ATOM_GET_PATH,
        }),
    );
}

pub const ATOM_PARSE_YAML: NativeFn = |args, context, call_span| {
    let text = arg(args, 0).to_string();
    match parse_document(&text) {
        Ok(doc) => Ok(Value::from(&doc)),
        Err(e) => Err(context.eval_error(format!("YAMLException: {e}"), call_span)),
    }
};

pub const ATOM_GET_PATH: NativeFn = |args, _, _| {
    let path = Path::parse(&arg(args, 1).to_string());
    Ok(match arg(args, 0) {
        Value::String(text) => match parse_document(&text) {
            Ok(doc) => path.resolve(&doc).map(Value::from).unwrap_or_default(),
            Err(_) => Value::Undefined,
        },
        target => resolve_value(&target, &path),
    })
};

/// Walks a snippet value with the same rules as the document query.
fn resolve_value(target: &Value, path: &Path) -> Value {
    let mut current = target;
    for segment in &path.0 {
        let next = match current {
            Value::Map(map) => map.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Value::Undefined,
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn resolve_value_walks_maps_and_lists() {
        let doc = Value::Map(BTreeMap::from([(
            "items".to_string(),
            Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
        )]));
        assert!(resolve_value(&doc, &Path::parse("items.1")).strict_equals(&Value::String("b".into())));
        assert!(matches!(resolve_value(&doc, &Path::parse("items.2")), Value::Undefined));
        assert!(matches!(resolve_value(&doc, &Path::parse("items.x")), Value::Undefined));
    }
}
