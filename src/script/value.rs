//! Runtime values for snippet evaluation.
//!
//! Semantics follow the JavaScript conventions check authors already know:
//! `undefined` and `null` are distinct, only `undefined`, `null`, `false`,
//! `0`, `NaN` and `""` are falsy, and `===` never coerces.

use std::{collections::BTreeMap, fmt, rc::Rc};

use regex::Regex;

use crate::errors::DojoError;
use crate::script::ast::{Lambda, Span};
use crate::script::eval::EvaluationContext;

/// Native (Rust) function callable from a snippet.
pub type NativeFn =
    fn(args: &[Value], context: &mut EvaluationContext<'_>, call_span: Span) -> Result<Value, DojoError>;

#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native({})", self.name)
    }
}

/// An arrow function together with the bindings visible where it was written.
#[derive(Debug)]
pub struct Closure {
    pub lambda: std::sync::Arc<Lambda>,
    pub captured_env: std::collections::HashMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Regex(Regex),
    Closure(Rc<Closure>),
    Native(Native),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
            Value::Regex(_) => "regexp",
            Value::Closure(_) | Value::Native(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric coercion, as performed by arithmetic and relational operators.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::List(items) if items.is_empty() => 0.0,
            Value::List(items) if items.len() == 1 => items[0].to_number(),
            _ => f64::NAN,
        }
    }

    /// `===`: no coercion; composite values are never equal to one another.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            _ => false,
        }
    }

    /// `==`: `null == undefined`, and primitives of different types compare numerically.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::String(_), Value::Number(_))
            | (Value::Number(_), Value::String(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => {
                if self.is_primitive() && other.is_primitive() {
                    self.to_number() == other.to_number()
                } else {
                    false
                }
            }
            _ => self.strict_equals(other),
        }
    }

    fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }
}

/// Converts a parsed YAML document into a snippet value. Non-string mapping
/// keys are stringified, as property names always are in JavaScript.
impl From<&serde_yaml::Value> for Value {
    fn from(doc: &serde_yaml::Value) -> Self {
        match doc {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_yaml::Value::Mapping(map) => Value::Map(
                map.iter()
                    .filter_map(|(k, v)| crate::document::key_string(k).map(|k| (k, Value::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

fn format_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

/// Formats a value the way `String(value)` would.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "[object Object]"),
            Value::Regex(re) => write!(f, "/{}/", re.as_str()),
            Value::Closure(_) | Value::Native(_) => write!(f, "function"),
        }
    }
}
