//! # Math and Conversion Atoms
//!
//! The `Math` namespace plus the `Number` and `Boolean` conversions.

use crate::script::atoms::{arg, AtomRegistry, Global};
use crate::script::value::{Native, NativeFn, Value};

const MATH_NAMESPACE: &[Native] = &[
    Native {
        name: "min",
        func: MATH_MIN,
    },
    Native {
        name: "max",
        func: MATH_MAX,
    },
    Native {
        name: "abs",
        func: MATH_ABS,
    },
    Native {
        name: "floor",
        func: MATH_FLOOR,
    },
    Native {
        name: "ceil",
        func: MATH_CEIL,
    },
    Native {
        name: "round",
        func: MATH_ROUND,
    },
];

pub fn register(registry: &mut AtomRegistry) {
    registry.register_global("Math", Global::Namespace(MATH_NAMESPACE));
    registry.register_global("Number", Global::Function(Native { name: "Number", func: ATOM_NUMBER }));
    registry.register_global("Boolean", Global::Function(Native { name: "Boolean", func: ATOM_BOOLEAN }));
}

/// `Number(value)`; `Number()` is `0`.
pub const ATOM_NUMBER: NativeFn = |args, _, _| {
    Ok(Value::Number(match args.first() {
        Some(value) => value.to_number(),
        None => 0.0,
    }))
};

pub const ATOM_BOOLEAN: NativeFn = |args, _, _| Ok(Value::Bool(arg(args, 0).is_truthy()));

/// `Math.min(...)`: `Infinity` with no arguments, `NaN` if any argument is not numeric.
pub const MATH_MIN: NativeFn = |args, _, _| Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)));

pub const MATH_MAX: NativeFn =
    |args, _, _| Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)));

pub const MATH_ABS: NativeFn = |args, _, _| Ok(Value::Number(arg(args, 0).to_number().abs()));

pub const MATH_FLOOR: NativeFn = |args, _, _| Ok(Value::Number(arg(args, 0).to_number().floor()));

pub const MATH_CEIL: NativeFn = |args, _, _| Ok(Value::Number(arg(args, 0).to_number().ceil()));

/// Rounds half up, so `Math.round(-2.5)` is `-2`.
pub const MATH_ROUND: NativeFn = |args, _, _| Ok(Value::Number((arg(args, 0).to_number() + 0.5).floor()));

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).try_fold(init, |acc, n| {
        if n.is_nan() {
            None
        } else {
            Some(pick(acc, n))
        }
    })
    .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_propagates_nan() {
        let args = [Value::Number(3.0), Value::String("1".into())];
        assert_eq!(fold_numbers(&args, f64::INFINITY, f64::min), 1.0);
        let args = [Value::Number(3.0), Value::Undefined];
        assert!(fold_numbers(&args, f64::INFINITY, f64::min).is_nan());
        assert_eq!(fold_numbers(&[], f64::NEG_INFINITY, f64::max), f64::NEG_INFINITY);
    }
}
