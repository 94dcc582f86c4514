// # Snippet Atom System
//
// Atoms are the native operations a snippet can reach. There are two kinds:
//
// - **Globals**: names bound in every snippet's environment (`String`,
//   `Math`, `yaml`, `getPath`, ...). A global is either a callable or a
//   namespace object whose members are callables.
// - **Methods**: operations looked up by receiver type and name when a
//   snippet writes `value.name(...)`.
//
// The registry holds only function pointers and names. Runtime values are
// created per evaluation, so the registry itself can live in a shared static.
//
// ## Module Structure
//
// - **`string`**: string and regex methods, `String()` and `RegExp()`
// - **`collections`**: array and object methods, `Array` and `Object`
// - **`math`**: `Math`, `Number()` and `Boolean()`
// - **`document`**: `yaml`, `parseYaml` and `getPath`

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::errors::DojoError;
use crate::script::ast::Span;
use crate::script::eval::EvaluationContext;
use crate::script::value::{Native, Value};

pub mod collections;
pub mod document;
pub mod math;
pub mod string;

// ============================================================================
// ATOM TYPES
// ============================================================================

/// A method: receives the value it was called on plus the evaluated arguments.
pub type MethodFn = fn(
    receiver: &Value,
    args: &[Value],
    context: &mut EvaluationContext<'_>,
    call_span: Span,
) -> Result<Value, DojoError>;

/// A name bound in every snippet environment.
#[derive(Debug, Clone, Copy)]
pub enum Global {
    Function(Native),
    Namespace(&'static [Native]),
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Default)]
pub struct AtomRegistry {
    methods: HashMap<(&'static str, &'static str), MethodFn>,
    globals: Vec<(&'static str, Global)>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_method(&mut self, type_name: &'static str, name: &'static str, func: MethodFn) {
        self.methods.insert((type_name, name), func);
    }

    pub fn register_global(&mut self, name: &'static str, global: Global) {
        self.globals.retain(|(existing, _)| *existing != name);
        self.globals.push((name, global));
    }

    pub fn method(&self, type_name: &str, name: &str) -> Option<MethodFn> {
        self.methods.get(&(type_name, name)).copied()
    }

    /// Sorted method names available on a receiver type, for diagnostics.
    pub fn method_names(&self, type_name: &str) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .methods
            .keys()
            .filter(|(ty, _)| *ty == type_name)
            .map(|(_, name)| *name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn global_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.globals.iter().map(|(name, _)| *name)
    }

    /// Materializes the global environment for one evaluation.
    pub fn bindings(&self) -> HashMap<String, Value> {
        self.globals
            .iter()
            .map(|(name, global)| {
                let value = match global {
                    Global::Function(native) => Value::Native(*native),
                    Global::Namespace(members) => Value::Map(
                        members
                            .iter()
                            .map(|native| (native.name.to_string(), Value::Native(*native)))
                            .collect::<BTreeMap<_, _>>(),
                    ),
                };
                (name.to_string(), value)
            })
            .collect()
    }
}

/// The registry every snippet runs against.
pub static STANDARD_ATOMS: Lazy<AtomRegistry> = Lazy::new(build_standard_registry);

pub fn build_standard_registry() -> AtomRegistry {
    let mut registry = AtomRegistry::new();
    string::register(&mut registry);
    collections::register(&mut registry);
    math::register(&mut registry);
    document::register(&mut registry);
    registry
}

// ============================================================================
// HELPERS
// ============================================================================

/// The argument at `index`, or `undefined` when it was not supplied.
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Optional integer argument, truncated toward zero as JavaScript does.
pub fn int_arg(args: &[Value], index: usize) -> Option<i64> {
    match args.get(index) {
        None | Some(Value::Undefined) => None,
        Some(value) => {
            let n = value.to_number();
            Some(if n.is_nan() { 0 } else { n.trunc() as i64 })
        }
    }
}

/// Resolves `slice(start, end)` bounds against a length, with negative
/// indices counting from the end.
pub fn slice_bounds(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let resolve = |i: i64| -> usize {
        if i < 0 {
            len.saturating_sub(i.unsigned_abs() as usize)
        } else {
            (i as usize).min(len)
        }
    };
    let start = start.map(resolve).unwrap_or(0);
    let end = end.map(resolve).unwrap_or(len);
    (start, end.max(start))
}

/// Receiver access for methods registered under a given type name. The
/// registry only dispatches matching receivers, so the fallbacks are inert.
pub(crate) fn receiver_str(receiver: &Value) -> &str {
    receiver.as_str().unwrap_or_default()
}

pub(crate) fn receiver_list(receiver: &Value) -> &[Value] {
    receiver.as_list().unwrap_or(&[])
}
