//! Snippet Parser
//!
//! Converts custom check source into a [`Program`]. The grammar lives in
//! `grammar.pest`; operator precedence is resolved with a Pratt parser so the
//! grammar itself stays flat. This parser is purely syntactic: unknown names
//! and type errors are the evaluator's business.

use std::sync::Arc;

use once_cell::sync::Lazy;
use pest::{
    iterators::Pair,
    pratt_parser::{Assoc, Op, PrattParser},
    Parser,
};
use pest_derive::Parser;

use crate::errors::{to_error_source, DojoError, SourceArc};
use crate::err_ctx;
use crate::script::ast::{
    spanned, AstNode, BinaryOp, Expr, Lambda, LambdaBody, Program, Span, Stmt, UnaryOp,
};

#[derive(Parser)]
#[grammar = "script/grammar.pest"]
struct SnippetParser;

static PRATT: Lazy<PrattParser<Rule>> = Lazy::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg))
        .op(Op::postfix(Rule::member)
            | Op::postfix(Rule::opt_member)
            | Op::postfix(Rule::index)
            | Op::postfix(Rule::call))
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse snippet source into a program.
pub fn parse(snippet: &str) -> Result<Program, DojoError> {
    let source = to_error_source("custom check", snippet);
    let mut pairs = SnippetParser::parse(Rule::program, snippet)
        .map_err(|e| convert_parse_error(e, &source))?;

    let builder = AstBuilder { source: &source };
    let program = builder.next(&mut pairs, "program", Span::default())?;
    let body = program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| builder.stmt(p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Program { body, source })
}

// ============================================================================
// AST BUILDERS
// ============================================================================

struct AstBuilder<'s> {
    source: &'s SourceArc,
}

impl AstBuilder<'_> {
    fn stmt(&self, pair: Pair<Rule>) -> Result<Stmt, DojoError> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::let_stmt => {
                let mut inner = significant(pair);
                let name = self.next(&mut inner, "binding name", span)?.as_str().to_string();
                let value = self.expr(self.next(&mut inner, "initializer", span)?)?;
                Ok(Stmt::Let { name, value, span })
            }
            Rule::return_stmt => {
                let value = significant(pair).next().map(|p| self.expr(p)).transpose()?;
                Ok(Stmt::Return(value, span))
            }
            Rule::if_stmt => {
                let mut inner = significant(pair);
                let condition = self.expr(self.next(&mut inner, "if condition", span)?)?;
                let then_branch = self.stmt(self.next(&mut inner, "if body", span)?)?;
                let else_branch = inner.next().map(|p| self.stmt(p)).transpose()?;
                Ok(Stmt::If {
                    condition,
                    then_branch: Box::new(then_branch),
                    else_branch: else_branch.map(Box::new),
                })
            }
            Rule::block => Ok(Stmt::Block(self.block(pair)?)),
            Rule::empty_stmt => Ok(Stmt::Empty),
            Rule::expr_stmt => {
                let expr = self.expr(self.next(&mut pair.into_inner(), "expression", span)?)?;
                Ok(Stmt::Expr(expr))
            }
            rule => Err(self.unsupported(rule, span)),
        }
    }

    fn block(&self, pair: Pair<Rule>) -> Result<Vec<Stmt>, DojoError> {
        pair.into_inner().map(|p| self.stmt(p)).collect()
    }

    fn expr(&self, pair: Pair<Rule>) -> Result<AstNode, DojoError> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::expr => self.expr(self.next(&mut pair.into_inner(), "expression", span)?),
            Rule::arrow => self.arrow(pair),
            Rule::ternary => self.ternary(pair),
            Rule::binary => self.binary(pair),
            rule => Err(self.unsupported(rule, span)),
        }
    }

    fn arrow(&self, pair: Pair<Rule>) -> Result<AstNode, DojoError> {
        let span = get_span(&pair);
        let mut inner = pair.into_inner();
        let params = self
            .next(&mut inner, "arrow parameters", span)?
            .into_inner()
            .map(|p| p.as_str().to_string())
            .collect();
        let body_pair = self.next(&mut inner, "arrow body", span)?;
        let body = match body_pair.as_rule() {
            Rule::block => LambdaBody::Block(self.block(body_pair)?),
            _ => LambdaBody::Expr(self.expr(body_pair)?),
        };
        Ok(spanned(
            Expr::Lambda(Arc::new(Lambda { params, body, span })),
            span,
        ))
    }

    fn ternary(&self, pair: Pair<Rule>) -> Result<AstNode, DojoError> {
        let span = get_span(&pair);
        let mut inner = pair.into_inner();
        let condition = self.expr(self.next(&mut inner, "expression", span)?)?;
        let Some(then_pair) = inner.next() else {
            return Ok(condition);
        };
        let then_branch = self.expr(then_pair)?;
        let else_branch = self.expr(self.next(&mut inner, "else branch", span)?)?;
        Ok(spanned(
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn binary(&self, pair: Pair<Rule>) -> Result<AstNode, DojoError> {
        PRATT
            .map_primary(|p| self.primary(p))
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                let span = join(get_span(&op), rhs.span);
                let op = match op.as_rule() {
                    Rule::not => UnaryOp::Not,
                    Rule::neg => UnaryOp::Neg,
                    rule => return Err(self.unsupported(rule, span)),
                };
                Ok(spanned(Expr::Unary { op, operand: rhs }, span))
            })
            .map_postfix(|lhs, op| {
                let lhs = lhs?;
                let span = join(lhs.span, get_span(&op));
                self.postfix(lhs, op, span)
            })
            .map_infix(|lhs, op, rhs| {
                let (lhs, rhs) = (lhs?, rhs?);
                let span = join(lhs.span, rhs.span);
                let op = binary_op(op.as_rule()).ok_or_else(|| self.unsupported(op.as_rule(), span))?;
                Ok(spanned(Expr::Binary { op, lhs, rhs }, span))
            })
            .parse(pair.into_inner())
    }

    fn postfix(&self, object: AstNode, op: Pair<Rule>, span: Span) -> Result<AstNode, DojoError> {
        let expr = match op.as_rule() {
            Rule::member | Rule::opt_member => Expr::Member {
                optional: op.as_rule() == Rule::opt_member,
                property: self
                    .next(&mut op.into_inner(), "property name", span)?
                    .as_str()
                    .to_string(),
                object,
            },
            Rule::index => Expr::Index {
                index: self.expr(self.next(&mut op.into_inner(), "index", span)?)?,
                object,
            },
            Rule::call => Expr::Call {
                args: op
                    .into_inner()
                    .map(|p| self.expr(p))
                    .collect::<Result<_, _>>()?,
                callee: object,
            },
            rule => return Err(self.unsupported(rule, span)),
        };
        Ok(spanned(expr, span))
    }

    fn primary(&self, pair: Pair<Rule>) -> Result<AstNode, DojoError> {
        let span = get_span(&pair);
        let expr = match pair.as_rule() {
            Rule::expr => return self.expr(pair),
            Rule::number => {
                let text = pair.as_str();
                let value = text.parse::<f64>().map_err(|_| {
                    err_ctx!(Parse, format!("invalid number literal `{text}`"), self.source, span)
                })?;
                Expr::Number(value)
            }
            Rule::string => Expr::String(unescape_string(pair.as_str())),
            Rule::boolean => Expr::Bool(pair.as_str() == "true"),
            Rule::null => Expr::Null,
            Rule::undefined => Expr::Undefined,
            Rule::regex => {
                let mut inner = pair.into_inner();
                let pattern = self.next(&mut inner, "regex body", span)?.as_str().to_string();
                let flags = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
                Expr::Regex { pattern, flags }
            }
            Rule::array => Expr::Array(
                pair.into_inner()
                    .map(|p| self.expr(p))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::object => Expr::Object(
                pair.into_inner()
                    .map(|p| self.property(p))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::ident => Expr::Ident(pair.as_str().to_string()),
            rule => return Err(self.unsupported(rule, span)),
        };
        Ok(spanned(expr, span))
    }

    fn property(&self, pair: Pair<Rule>) -> Result<(String, AstNode), DojoError> {
        let span = get_span(&pair);
        let mut inner = pair.into_inner();
        let first = self.next(&mut inner, "property", span)?;
        match first.as_rule() {
            // Shorthand `{ passed }`.
            Rule::ident => {
                let name = first.as_str().to_string();
                let value = spanned(Expr::Ident(name.clone()), get_span(&first));
                Ok((name, value))
            }
            _ => {
                let key_pair = self.next(&mut first.into_inner(), "property key", span)?;
                let key = match key_pair.as_rule() {
                    Rule::string => unescape_string(key_pair.as_str()),
                    _ => key_pair.as_str().to_string(),
                };
                let value = self.expr(self.next(&mut inner, "property value", span)?)?;
                Ok((key, value))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn next<'i>(
        &self,
        pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
        element: &str,
        span: Span,
    ) -> Result<Pair<'i, Rule>, DojoError> {
        pairs
            .next()
            .ok_or_else(|| err_ctx!(Parse, format!("missing {element}"), self.source, span))
    }

    fn unsupported(&self, rule: Rule, span: Span) -> DojoError {
        err_ctx!(Parse, format!("unsupported construct: {rule:?}"), self.source, span)
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

/// Inner pairs with keyword tokens dropped.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| {
        !matches!(
            p.as_rule(),
            Rule::kw_decl | Rule::kw_return | Rule::kw_if | Rule::kw_else
        )
    })
}

fn binary_op(rule: Rule) -> Option<BinaryOp> {
    Some(match rule {
        Rule::or => BinaryOp::Or,
        Rule::and => BinaryOp::And,
        Rule::strict_eq => BinaryOp::StrictEq,
        Rule::strict_ne => BinaryOp::StrictNe,
        Rule::eq => BinaryOp::Eq,
        Rule::ne => BinaryOp::Ne,
        Rule::lt => BinaryOp::Lt,
        Rule::le => BinaryOp::Le,
        Rule::gt => BinaryOp::Gt,
        Rule::ge => BinaryOp::Ge,
        Rule::add => BinaryOp::Add,
        Rule::sub => BinaryOp::Sub,
        Rule::mul => BinaryOp::Mul,
        Rule::div => BinaryOp::Div,
        Rule::rem => BinaryOp::Rem,
        _ => return None,
    })
}

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn join(a: Span, b: Span) -> Span {
    Span {
        start: a.start.min(b.start),
        end: a.end.max(b.end),
    }
}

fn unescape_string(text: &str) -> String {
    // Quotes are single-byte ASCII, so slicing them off is char-safe.
    let inner = &text[1..text.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, source: &SourceArc) -> DojoError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span {
            start: pos,
            end: pos,
        },
        pest::error::InputLocation::Span((start, end)) => Span { start, end },
    };

    let message = format!("syntax error: {}", error.variant.message());
    err_ctx!(
        Parse,
        message,
        source,
        span,
        "custom checks accept a small JavaScript-like subset: const, if, return, and expressions"
    )
}
