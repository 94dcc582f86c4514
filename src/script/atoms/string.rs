//! # String and Regex Atoms
//!
//! Methods on string and regex receivers, plus the `String` and `RegExp`
//! globals. Positions and lengths count characters.

use crate::script::atoms::{arg, int_arg, receiver_str, slice_bounds, AtomRegistry, Global, MethodFn};
use crate::script::eval::compile_regex;
use crate::script::value::{Native, NativeFn, Value};

pub fn register(registry: &mut AtomRegistry) {
    registry.register_global("String", Global::Function(Native { name: "String", func: ATOM_STRING }));
    registry.register_global("RegExp", Global::Function(Native { name: "RegExp", func: ATOM_REGEXP }));

    registry.register_method("string", "includes", STRING_INCLUDES);
    registry.register_method("string", "startsWith", STRING_STARTS_WITH);
    registry.register_method("string", "endsWith", STRING_ENDS_WITH);
    registry.register_method("string", "indexOf", STRING_INDEX_OF);
    registry.register_method("string", "trim", STRING_TRIM);
    registry.register_method("string", "trimStart", STRING_TRIM_START);
    registry.register_method("string", "trimEnd", STRING_TRIM_END);
    registry.register_method("string", "toLowerCase", STRING_TO_LOWER);
    registry.register_method("string", "toUpperCase", STRING_TO_UPPER);
    registry.register_method("string", "split", STRING_SPLIT);
    registry.register_method("string", "slice", STRING_SLICE);
    registry.register_method("string", "charAt", STRING_CHAR_AT);
    registry.register_method("string", "match", STRING_MATCH);
    registry.register_method("string", "replace", STRING_REPLACE);
    registry.register_method("string", "replaceAll", STRING_REPLACE_ALL);

    registry.register_method("regexp", "test", REGEX_TEST);
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

/// `String(value)`: the string form of any value; `String()` is `""`.
pub const ATOM_STRING: NativeFn = |args, _, _| {
    Ok(Value::String(match args.first() {
        Some(value) => value.to_string(),
        None => String::new(),
    }))
};

/// `RegExp(pattern, flags?)`
pub const ATOM_REGEXP: NativeFn = |args, _, _| match arg(args, 0) {
    Value::Regex(re) => Ok(Value::Regex(re)),
    pattern => {
        let flags = match arg(args, 1) {
            Value::Undefined => String::new(),
            flags => flags.to_string(),
        };
        compile_regex(&pattern.to_string(), &flags).map(Value::Regex)
    }
};

// ============================================================================
// SEARCH
// ============================================================================

pub const STRING_INCLUDES: MethodFn = |receiver, args, _, _| {
    let haystack = from_char(receiver_str(receiver), int_arg(args, 1));
    Ok(Value::Bool(haystack.contains(&arg(args, 0).to_string())))
};

pub const STRING_STARTS_WITH: MethodFn = |receiver, args, _, _| {
    let haystack = from_char(receiver_str(receiver), int_arg(args, 1));
    Ok(Value::Bool(haystack.starts_with(&arg(args, 0).to_string())))
};

pub const STRING_ENDS_WITH: MethodFn = |receiver, args, _, _| {
    Ok(Value::Bool(receiver_str(receiver).ends_with(&arg(args, 0).to_string())))
};

/// Character index of the first occurrence, or `-1`.
pub const STRING_INDEX_OF: MethodFn = |receiver, args, _, _| {
    let s = receiver_str(receiver);
    let index = s
        .find(&arg(args, 0).to_string())
        .map(|byte| s[..byte].chars().count() as f64)
        .unwrap_or(-1.0);
    Ok(Value::Number(index))
};

/// `str.match(re)`: the first match and its groups, or `null`.
pub const STRING_MATCH: MethodFn = |receiver, args, _, _| {
    let re = match arg(args, 0) {
        Value::Regex(re) => re,
        Value::Undefined => compile_regex("", "")?,
        other => compile_regex(&other.to_string(), "")?,
    };
    Ok(match re.captures(receiver_str(receiver)) {
        Some(caps) => Value::List(
            caps.iter()
                .map(|group| {
                    group
                        .map(|m| Value::String(m.as_str().to_string()))
                        .unwrap_or_default()
                })
                .collect(),
        ),
        None => Value::Null,
    })
};

pub const REGEX_TEST: MethodFn = |receiver, args, _, _| {
    let Value::Regex(re) = receiver else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(re.is_match(&arg(args, 0).to_string())))
};

// ============================================================================
// TRANSFORMS
// ============================================================================

pub const STRING_TRIM: MethodFn =
    |receiver, _, _, _| Ok(Value::String(receiver_str(receiver).trim().to_string()));

pub const STRING_TRIM_START: MethodFn =
    |receiver, _, _, _| Ok(Value::String(receiver_str(receiver).trim_start().to_string()));

pub const STRING_TRIM_END: MethodFn =
    |receiver, _, _, _| Ok(Value::String(receiver_str(receiver).trim_end().to_string()));

pub const STRING_TO_LOWER: MethodFn =
    |receiver, _, _, _| Ok(Value::String(receiver_str(receiver).to_lowercase()));

pub const STRING_TO_UPPER: MethodFn =
    |receiver, _, _, _| Ok(Value::String(receiver_str(receiver).to_uppercase()));

/// `str.split(separator?, limit?)`; the separator may be a string or a regex.
pub const STRING_SPLIT: MethodFn = |receiver, args, _, _| {
    let s = receiver_str(receiver);
    let parts: Vec<String> = match arg(args, 0) {
        Value::Undefined => vec![s.to_string()],
        Value::Regex(re) => re.split(s).map(String::from).collect(),
        separator => {
            let separator = separator.to_string();
            if separator.is_empty() {
                s.chars().map(String::from).collect()
            } else {
                s.split(separator.as_str()).map(String::from).collect()
            }
        }
    };
    let limit = int_arg(args, 1).map_or(usize::MAX, |n| n.max(0) as usize);
    Ok(Value::List(parts.into_iter().take(limit).map(Value::String).collect()))
};

pub const STRING_SLICE: MethodFn = |receiver, args, _, _| {
    let chars: Vec<char> = receiver_str(receiver).chars().collect();
    let (start, end) = slice_bounds(chars.len(), int_arg(args, 0), int_arg(args, 1));
    Ok(Value::String(chars[start..end].iter().collect()))
};

pub const STRING_CHAR_AT: MethodFn = |receiver, args, _, _| {
    let index = int_arg(args, 0).unwrap_or(0);
    let ch = usize::try_from(index)
        .ok()
        .and_then(|i| receiver_str(receiver).chars().nth(i));
    Ok(Value::String(ch.map(String::from).unwrap_or_default()))
};

/// Replaces the first occurrence. Regex replacements may refer to groups as `$1`.
pub const STRING_REPLACE: MethodFn = |receiver, args, _, _| {
    let s = receiver_str(receiver);
    let replacement = arg(args, 1).to_string();
    Ok(Value::String(match arg(args, 0) {
        Value::Regex(re) => re.replace(s, replacement.as_str()).into_owned(),
        pattern => s.replacen(&pattern.to_string(), &replacement, 1),
    }))
};

pub const STRING_REPLACE_ALL: MethodFn = |receiver, args, _, _| {
    let s = receiver_str(receiver);
    let replacement = arg(args, 1).to_string();
    Ok(Value::String(match arg(args, 0) {
        Value::Regex(re) => re.replace_all(s, replacement.as_str()).into_owned(),
        pattern => s.replace(&pattern.to_string(), &replacement),
    }))
};

// The suffix of `s` starting at character `position`.
fn from_char(s: &str, position: Option<i64>) -> &str {
    let skip = position.unwrap_or(0).max(0) as usize;
    match s.char_indices().nth(skip) {
        Some((byte, _)) => &s[byte..],
        None if skip == 0 => s,
        None => "",
    }
}
