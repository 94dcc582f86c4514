//! Snippet evaluation: AST → Value.
//!
//! A tree-walking interpreter over [`Program`]. Names resolve only against
//! the bindings handed in by the executor plus any `const`/`let` the snippet
//! declares; there is no global object, no host access and no way to mutate
//! a binding once declared. The language has no loops and no named
//! functions, but an arrow function can still be applied to itself, so
//! evaluation is bounded by two limits: expression nesting (`max_depth`) and
//! closure calls in flight (`max_call_depth`). Exceeding either fails the
//! snippet with an `Eval` error.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use regex::{Regex, RegexBuilder};

use crate::err_ctx;
use crate::errors::{DojoError, SourceArc};
use crate::script::ast::{AstNode, BinaryOp, Expr, LambdaBody, Program, Span, Stmt, UnaryOp};
use crate::script::atoms::AtomRegistry;
use crate::script::value::{Closure, Value};

pub const DEFAULT_MAX_DEPTH: usize = 128;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 32;

// ===================================================================================================
// CORE DATA STRUCTURES: Evaluation Context
// ===================================================================================================

/// The context for a single evaluation, passed to atoms and all evaluation functions.
pub struct EvaluationContext<'a> {
    pub atoms: &'a AtomRegistry,
    pub source: SourceArc,
    pub env: HashMap<String, Value>,
    pub depth: usize,
    pub max_depth: usize,
    pub call_depth: usize,
    pub max_call_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(atoms: &'a AtomRegistry, source: SourceArc, env: HashMap<String, Value>) -> Self {
        Self {
            atoms,
            source,
            env,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Invokes a function value: a native atom or an arrow function.
    pub fn call_value(
        &mut self,
        func: &Value,
        args: &[Value],
        call_span: Span,
    ) -> Result<Value, DojoError> {
        match func {
            Value::Native(native) => (native.func)(args, self, call_span),
            Value::Closure(closure) => self.call_closure(closure, args, call_span),
            other => Err(self.type_error(format!("{} is not a function", other.type_name()), call_span)),
        }
    }

    fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        args: &[Value],
        call_span: Span,
    ) -> Result<Value, DojoError> {
        if self.call_depth >= self.max_call_depth {
            return Err(self.eval_error("Maximum call depth exceeded", call_span));
        }

        let mut frame = closure.captured_env.clone();
        for (i, param) in closure.lambda.params.iter().enumerate() {
            frame.insert(param.clone(), args.get(i).cloned().unwrap_or_default());
        }

        let saved = std::mem::replace(&mut self.env, frame);
        self.call_depth += 1;
        let result = match &closure.lambda.body {
            LambdaBody::Expr(body) => evaluate_ast_node(body, self),
            LambdaBody::Block(stmts) => execute_block(stmts, self).map(Flow::into_value),
        };
        self.call_depth -= 1;
        self.env = saved;
        result
    }

    pub fn type_error(&self, message: impl Into<String>, span: Span) -> DojoError {
        err_ctx!(TypeError, message.into(), &self.source, span)
    }

    pub fn eval_error(&self, message: impl Into<String>, span: Span) -> DojoError {
        err_ctx!(Eval, message.into(), &self.source, span)
    }
}

/// Control flow out of a statement.
enum Flow {
    /// Fell through; carries the value of an expression statement, if any.
    Continue(Option<Value>),
    Return(Value),
}

impl Flow {
    fn into_value(self) -> Value {
        match self {
            Flow::Return(value) => value,
            Flow::Continue(_) => Value::Undefined,
        }
    }
}

// ===================================================================================================
// PUBLIC API: Program Evaluation Interface
// ===================================================================================================

/// Runs a program. The result is the first `return`ed value, or else the
/// value of the last expression statement.
pub fn run_program(program: &Program, context: &mut EvaluationContext) -> Result<Value, DojoError> {
    match execute_block(&program.body, context)? {
        Flow::Return(value) | Flow::Continue(Some(value)) => Ok(value),
        Flow::Continue(None) => Ok(Value::Undefined),
    }
}

/// Evaluates a single expression node.
pub fn evaluate_ast_node(expr: &AstNode, context: &mut EvaluationContext) -> Result<Value, DojoError> {
    if context.depth > context.max_depth {
        return Err(context.eval_error("Recursion limit exceeded", expr.span));
    }
    context.depth += 1;
    let result = evaluate_expr(expr, context);
    context.depth -= 1;
    result
}

/// Compiles a regex literal or `RegExp(...)` pattern. `g`, `y` and `u` are
/// accepted and ignored: matching here is always a single test.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, DojoError> {
    if let Some(flag) = flags.chars().find(|c| !"gimsuy".contains(*c)) {
        return Err(crate::err_msg!(Pattern, "invalid regular expression flag `{flag}`"));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| DojoError::invalid_pattern(pattern, e))
}

// ===================================================================================================
// STATEMENTS
// ===================================================================================================

fn execute_block(stmts: &[Stmt], context: &mut EvaluationContext) -> Result<Flow, DojoError> {
    let mut last = None;
    for stmt in stmts {
        match execute_stmt(stmt, context)? {
            Flow::Return(value) => return Ok(Flow::Return(value)),
            Flow::Continue(Some(value)) => last = Some(value),
            Flow::Continue(None) => {}
        }
    }
    Ok(Flow::Continue(last))
}

fn execute_stmt(stmt: &Stmt, context: &mut EvaluationContext) -> Result<Flow, DojoError> {
    match stmt {
        Stmt::Let { name, value, .. } => {
            let value = evaluate_ast_node(value, context)?;
            context.env.insert(name.clone(), value);
            Ok(Flow::Continue(None))
        }
        Stmt::Return(value, _) => {
            let value = match value {
                Some(expr) => evaluate_ast_node(expr, context)?,
                None => Value::Undefined,
            };
            Ok(Flow::Return(value))
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if evaluate_ast_node(condition, context)?.is_truthy() {
                execute_stmt(then_branch, context)
            } else if let Some(else_branch) = else_branch {
                execute_stmt(else_branch, context)
            } else {
                Ok(Flow::Continue(None))
            }
        }
        Stmt::Block(stmts) => {
            let saved = context.env.clone();
            let flow = execute_block(stmts, context);
            context.env = saved;
            flow
        }
        Stmt::Expr(expr) => Ok(Flow::Continue(Some(evaluate_ast_node(expr, context)?))),
        Stmt::Empty => Ok(Flow::Continue(None)),
    }
}

// ===================================================================================================
// EXPRESSIONS
// ===================================================================================================

fn evaluate_expr(expr: &AstNode, context: &mut EvaluationContext) -> Result<Value, DojoError> {
    let span = expr.span;
    match &*expr.value {
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Regex { pattern, flags } => compile_regex(pattern, flags).map(Value::Regex),
        Expr::Ident(name) => context
            .env
            .get(name)
            .cloned()
            .ok_or_else(|| context.eval_error(format!("{name} is not defined"), span)),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate_ast_node(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Object(props) => {
            let mut map = BTreeMap::new();
            for (key, value) in props {
                map.insert(key.clone(), evaluate_ast_node(value, context)?);
            }
            Ok(Value::Map(map))
        }
        Expr::Member {
            object,
            property,
            optional,
        } => {
            let target = evaluate_ast_node(object, context)?;
            if target.is_nullish() {
                return nullish_access(&target, property, *optional, context, span);
            }
            Ok(get_property(&target, property))
        }
        Expr::Index { object, index } => {
            let target = evaluate_ast_node(object, context)?;
            let key = evaluate_ast_node(index, context)?;
            if target.is_nullish() {
                return nullish_access(&target, &key.to_string(), false, context, span);
            }
            Ok(get_index(&target, &key))
        }
        Expr::Call { callee, args } => evaluate_call(callee, args, context, span),
        Expr::Unary { op, operand } => {
            let value = evaluate_ast_node(operand, context)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
            })
        }
        Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, context),
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            if evaluate_ast_node(condition, context)?.is_truthy() {
                evaluate_ast_node(then_branch, context)
            } else {
                evaluate_ast_node(else_branch, context)
            }
        }
        Expr::Lambda(lambda) => Ok(Value::Closure(Rc::new(Closure {
            lambda: lambda.clone(),
            captured_env: context.env.clone(),
        }))),
    }
}

fn nullish_access(
    target: &Value,
    property: &str,
    optional: bool,
    context: &EvaluationContext,
    span: Span,
) -> Result<Value, DojoError> {
    if optional {
        return Ok(Value::Undefined);
    }
    Err(context.type_error(
        format!(
            "Cannot read properties of {} (reading '{}')",
            target.type_name(),
            property
        ),
        span,
    ))
}

fn evaluate_call(
    callee: &AstNode,
    args: &[AstNode],
    context: &mut EvaluationContext,
    span: Span,
) -> Result<Value, DojoError> {
    // Method call: the receiver decides what `name` means.
    if let Expr::Member {
        object,
        property,
        optional,
    } = &*callee.value
    {
        let receiver = evaluate_ast_node(object, context)?;
        if receiver.is_nullish() {
            return nullish_access(&receiver, property, *optional, context, span);
        }
        let values = evaluate_args(args, context)?;
        return call_method(&receiver, property, &values, context, span);
    }

    let func = evaluate_ast_node(callee, context)?;
    let values = evaluate_args(args, context)?;
    context.call_value(&func, &values, span)
}

fn evaluate_args(args: &[AstNode], context: &mut EvaluationContext) -> Result<Vec<Value>, DojoError> {
    args.iter().map(|arg| evaluate_ast_node(arg, context)).collect()
}

fn call_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
    context: &mut EvaluationContext,
    span: Span,
) -> Result<Value, DojoError> {
    if let Value::Map(map) = receiver {
        if let Some(member) = map.get(name) {
            return context.call_value(member, args, span);
        }
    }

    let Some(method) = context.atoms.method(receiver.type_name(), name) else {
        return Err(context.type_error(
            format!("{}.{} is not a function", receiver.type_name(), name),
            span,
        ));
    };
    method(receiver, args, context, span)
}

/// Property read on a non-nullish value; unknown properties are `undefined`.
pub fn get_property(target: &Value, property: &str) -> Value {
    match (target, property) {
        (Value::String(s), "length") => Value::Number(s.chars().count() as f64),
        (Value::List(items), "length") => Value::Number(items.len() as f64),
        (Value::Regex(re), "source") => Value::String(re.as_str().to_string()),
        (Value::Map(map), _) => map.get(property).cloned().unwrap_or_default(),
        (Value::List(_), _) | (Value::String(_), _) => match property.parse::<usize>() {
            Ok(i) => get_index(target, &Value::Number(i as f64)),
            Err(_) => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

fn get_index(target: &Value, key: &Value) -> Value {
    match (target, key) {
        (Value::List(items), Value::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => {
            items.get(*n as usize).cloned().unwrap_or_default()
        }
        (Value::String(s), Value::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => s
            .chars()
            .nth(*n as usize)
            .map(|c| Value::String(c.to_string()))
            .unwrap_or_default(),
        (_, Value::Number(_)) | (_, Value::String(_)) => get_property(target, &key.to_string()),
        _ => Value::Undefined,
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &AstNode,
    rhs: &AstNode,
    context: &mut EvaluationContext,
) -> Result<Value, DojoError> {
    // Logical operators short-circuit and yield an operand, not a boolean.
    if op == BinaryOp::And || op == BinaryOp::Or {
        let left = evaluate_ast_node(lhs, context)?;
        let short_circuit = match op {
            BinaryOp::And => !left.is_truthy(),
            _ => left.is_truthy(),
        };
        return if short_circuit {
            Ok(left)
        } else {
            evaluate_ast_node(rhs, context)
        };
    }

    let left = evaluate_ast_node(lhs, context)?;
    let right = evaluate_ast_node(rhs, context)?;
    Ok(apply_binary(op, &left, &right))
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let Some(ordering) = ordering else {
                return Value::Bool(false);
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(_), _)
            | (_, Value::String(_))
            | (Value::List(_), _)
            | (_, Value::List(_))
            | (Value::Map(_), _)
            | (_, Value::Map(_)) => Value::String(format!("{left}{right}")),
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::And | BinaryOp::Or => Value::Undefined,
    }
}
