//! # Collection Atoms
//!
//! Array methods (including the callback-taking `every`, `some`, `filter`,
//! `map` and `find`), object methods, and the `Array` and `Object` namespaces.
//! Callbacks receive `(item, index)`.

use crate::script::atoms::{arg, int_arg, receiver_list, slice_bounds, AtomRegistry, Global, MethodFn};
use crate::script::value::{Native, NativeFn, Value};

const ARRAY_NAMESPACE: &[Native] = &[Native {
    name: "isArray",
    func: ARRAY_IS_ARRAY,
}];

const OBJECT_NAMESPACE: &[Native] = &[
    Native {
        name: "keys",
        func: OBJECT_KEYS,
    },
    Native {
        name: "values",
        func: OBJECT_VALUES,
    },
    Native {
        name: "entries",
        func: OBJECT_ENTRIES,
    },
];

pub fn register(registry: &mut AtomRegistry) {
    registry.register_global("Array", Global::Namespace(ARRAY_NAMESPACE));
    registry.register_global("Object", Global::Namespace(OBJECT_NAMESPACE));

    registry.register_method("array", "includes", ARRAY_INCLUDES);
    registry.register_method("array", "indexOf", ARRAY_INDEX_OF);
    registry.register_method("array", "every", ARRAY_EVERY);
    registry.register_method("array", "some", ARRAY_SOME);
    registry.register_method("array", "filter", ARRAY_FILTER);
    registry.register_method("array", "map", ARRAY_MAP);
    registry.register_method("array", "find", ARRAY_FIND);
    registry.register_method("array", "findIndex", ARRAY_FIND_INDEX);
    registry.register_method("array", "join", ARRAY_JOIN);
    registry.register_method("array", "slice", ARRAY_SLICE);
    registry.register_method("array", "concat", ARRAY_CONCAT);

    registry.register_method("object", "hasOwnProperty", OBJECT_HAS_OWN_PROPERTY);
}

// ============================================================================
// NAMESPACES
// ============================================================================

pub const ARRAY_IS_ARRAY: NativeFn = |args, _, _| Ok(Value::Bool(matches!(arg(args, 0), Value::List(_))));

pub const OBJECT_KEYS: NativeFn = |args, _, _| {
    Ok(Value::List(
        own_entries(&arg(args, 0))
            .into_iter()
            .map(|(key, _)| Value::String(key))
            .collect(),
    ))
};

pub const OBJECT_VALUES: NativeFn = |args, _, _| {
    Ok(Value::List(
        own_entries(&arg(args, 0))
            .into_iter()
            .map(|(_, value)| value)
            .collect(),
    ))
};

pub const OBJECT_ENTRIES: NativeFn = |args, _, _| {
    Ok(Value::List(
        own_entries(&arg(args, 0))
            .into_iter()
            .map(|(key, value)| Value::List(vec![Value::String(key), value]))
            .collect(),
    ))
};

fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// ARRAY SEARCH
// ============================================================================

/// Same-value-zero membership: like `===`, except `NaN` finds `NaN`.
pub const ARRAY_INCLUDES: MethodFn = |receiver, args, _, _| {
    let needle = arg(args, 0);
    let found = receiver_list(receiver).iter().any(|item| {
        item.strict_equals(&needle) || matches!((item, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
    });
    Ok(Value::Bool(found))
};

pub const ARRAY_INDEX_OF: MethodFn = |receiver, args, _, _| {
    let needle = arg(args, 0);
    let index = receiver_list(receiver)
        .iter()
        .position(|item| item.strict_equals(&needle))
        .map_or(-1.0, |i| i as f64);
    Ok(Value::Number(index))
};

pub const ARRAY_EVERY: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    for (i, item) in receiver_list(receiver).iter().enumerate() {
        let result = context.call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span)?;
        if !result.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
};

pub const ARRAY_SOME: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    for (i, item) in receiver_list(receiver).iter().enumerate() {
        let result = context.call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span)?;
        if result.is_truthy() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
};

pub const ARRAY_FIND: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    for (i, item) in receiver_list(receiver).iter().enumerate() {
        if context
            .call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span)?
            .is_truthy()
        {
            return Ok(item.clone());
        }
    }
    Ok(Value::Undefined)
};

pub const ARRAY_FIND_INDEX: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    for (i, item) in receiver_list(receiver).iter().enumerate() {
        if context
            .call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span)?
            .is_truthy()
        {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Number(-1.0))
};

// ============================================================================
// ARRAY TRANSFORMS
// ============================================================================

pub const ARRAY_FILTER: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    let mut kept = Vec::new();
    for (i, item) in receiver_list(receiver).iter().enumerate() {
        if context
            .call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span)?
            .is_truthy()
        {
            kept.push(item.clone());
        }
    }
    Ok(Value::List(kept))
};

pub const ARRAY_MAP: MethodFn = |receiver, args, context, call_span| {
    let callback = arg(args, 0);
    receiver_list(receiver)
        .iter()
        .enumerate()
        .map(|(i, item)| context.call_value(&callback, &[item.clone(), Value::Number(i as f64)], call_span))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
};

/// `arr.join(separator = ",")`; `null` and `undefined` join as empty strings.
pub const ARRAY_JOIN: MethodFn = |receiver, args, _, _| {
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        separator => separator.to_string(),
    };
    let parts: Vec<String> = receiver_list(receiver)
        .iter()
        .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
        .collect();
    Ok(Value::String(parts.join(&separator)))
};

pub const ARRAY_SLICE: MethodFn = |receiver, args, _, _| {
    let items = receiver_list(receiver);
    let (start, end) = slice_bounds(items.len(), int_arg(args, 0), int_arg(args, 1));
    Ok(Value::List(items[start..end].to_vec()))
};

pub const ARRAY_CONCAT: MethodFn = |receiver, args, _, _| {
    let mut items = receiver_list(receiver).to_vec();
    for extra in args {
        match extra {
            Value::List(more) => items.extend(more.iter().cloned()),
            other => items.push(other.clone()),
        }
    }
    Ok(Value::List(items))
};

// ============================================================================
// OBJECTS
// ============================================================================

pub const OBJECT_HAS_OWN_PROPERTY: MethodFn = |receiver, args, _, _| {
    let key = arg(args, 0).to_string();
    Ok(Value::Bool(receiver.as_map().is_some_and(|map| map.contains_key(&key))))
};
