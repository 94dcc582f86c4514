//! Abstract syntax tree for custom check snippets.
//!
//! Nodes are `Arc`-shared so that a parsed [`Program`] can be held by an
//! exercise snapshot and evaluated from many threads at once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Byte range into the snippet text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

pub type AstNode = Spanned<Arc<Expr>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Regex {
        pattern: String,
        flags: String,
    },
    Ident(String),
    Array(Vec<AstNode>),
    Object(Vec<(String, AstNode)>),
    Member {
        object: AstNode,
        property: String,
        optional: bool,
    },
    Index {
        object: AstNode,
        index: AstNode,
    },
    Call {
        callee: AstNode,
        args: Vec<AstNode>,
    },
    Unary {
        op: UnaryOp,
        operand: AstNode,
    },
    Binary {
        op: BinaryOp,
        lhs: AstNode,
        rhs: AstNode,
    },
    Conditional {
        condition: AstNode,
        then_branch: AstNode,
        else_branch: AstNode,
    },
    Lambda(Arc<Lambda>),
}

impl Expr {
    /// Returns the type name of this AST node as a string (for diagnostics).
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Undefined => "Undefined",
            Expr::Null => "Null",
            Expr::Bool(_) => "Bool",
            Expr::Number(_) => "Number",
            Expr::String(_) => "String",
            Expr::Regex { .. } => "Regex",
            Expr::Ident(_) => "Ident",
            Expr::Array(_) => "Array",
            Expr::Object(_) => "Object",
            Expr::Member { .. } => "Member",
            Expr::Index { .. } => "Index",
            Expr::Call { .. } => "Call",
            Expr::Unary { .. } => "Unary",
            Expr::Binary { .. } => "Binary",
            Expr::Conditional { .. } => "Conditional",
            Expr::Lambda(_) => "Lambda",
        }
    }
}

/// An arrow function: `x => expr`, `(a, b) => { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: LambdaBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(AstNode),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: AstNode,
        span: Span,
    },
    Return(Option<AstNode>, Span),
    If {
        condition: AstNode,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    Expr(AstNode),
    Empty,
}

/// A parsed snippet, ready to evaluate.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub source: crate::errors::SourceArc,
}

pub(crate) fn spanned(expr: Expr, span: Span) -> AstNode {
    Spanned {
        value: Arc::new(expr),
        span,
    }
}
