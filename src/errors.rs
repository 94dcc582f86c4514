//! Dojo Error Handling
//!
//! Every failure the engine can report is a [`DojoError`]. Construct them with
//! the `err_msg!` and `err_ctx!` macros rather than by hand:
//!
//! - **`err_msg!`** for message-only errors: `err_msg!(Eval, "undefined is not a function")`
//! - **`err_ctx!`** for errors pointing into a snippet: `err_ctx!(Parse, "Syntax error", &src, span)`
//!
//! Errors are `miette` diagnostics, so the CLI can render them against the
//! snippet they came from. Inside the engine they follow one rule: an error
//! produced while grading a rule never escapes that rule. The orchestrator
//! turns it into a failing result and moves on to the next rule.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::script::ast::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Coarse classification of a [`DojoError`], used by tests and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Parse,
    Pattern,
    Eval,
    TypeError,
    Denied,
    InvalidRule,
    Config,
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "parse",
            ErrorType::Pattern => "pattern",
            ErrorType::Eval => "eval",
            ErrorType::TypeError => "type",
            ErrorType::Denied => "denied",
            ErrorType::InvalidRule => "invalid-rule",
            ErrorType::Config => "config",
            ErrorType::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an error points: the snippet it came from, the offending span, and
/// an optional hint for the author.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DojoError {
    #[error("Parse error: {message}")]
    Parse { message: String, ctx: ErrorContext },
    #[error("Pattern error: {message}")]
    Pattern {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<regex::Error>,
    },
    #[error("Evaluation error: {message}")]
    Eval { message: String, ctx: ErrorContext },
    #[error("Type error: {message}")]
    TypeError { message: String, ctx: ErrorContext },
    #[error("Denied: {message}")]
    Denied { message: String, ctx: ErrorContext },
    #[error("Invalid rule: {message}")]
    InvalidRule {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Config error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl DojoError {
    fn ctx(&self) -> &ErrorContext {
        match self {
            DojoError::Parse { ctx, .. }
            | DojoError::Pattern { ctx, .. }
            | DojoError::Eval { ctx, .. }
            | DojoError::TypeError { ctx, .. }
            | DojoError::Denied { ctx, .. }
            | DojoError::InvalidRule { ctx, .. }
            | DojoError::Config { ctx, .. }
            | DojoError::Io { ctx, .. } => ctx,
        }
    }

    /// The bare message, without the category prefix `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            DojoError::Parse { message, .. }
            | DojoError::Pattern { message, .. }
            | DojoError::Eval { message, .. }
            | DojoError::TypeError { message, .. }
            | DojoError::Denied { message, .. }
            | DojoError::InvalidRule { message, .. }
            | DojoError::Config { message, .. }
            | DojoError::Io { message, .. } => message,
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            DojoError::Parse { .. } => ErrorType::Parse,
            DojoError::Pattern { .. } => ErrorType::Pattern,
            DojoError::Eval { .. } => ErrorType::Eval,
            DojoError::TypeError { .. } => ErrorType::TypeError,
            DojoError::Denied { .. } => ErrorType::Denied,
            DojoError::InvalidRule { .. } => ErrorType::InvalidRule,
            DojoError::Config { .. } => ErrorType::Config,
            DojoError::Io { .. } => ErrorType::Io,
        }
    }

    /// Attaches a help line, replacing any existing one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let help = Some(help.into());
        match &mut self {
            DojoError::Parse { ctx, .. }
            | DojoError::Pattern { ctx, .. }
            | DojoError::Eval { ctx, .. }
            | DojoError::TypeError { ctx, .. }
            | DojoError::Denied { ctx, .. }
            | DojoError::InvalidRule { ctx, .. }
            | DojoError::Config { ctx, .. }
            | DojoError::Io { ctx, .. } => ctx.help = help,
        }
        self
    }

    pub fn invalid_pattern(pattern: &str, source: regex::Error) -> Self {
        DojoError::Pattern {
            message: format!("invalid regular expression `{pattern}`"),
            ctx: ErrorContext::none(),
            source: Some(source),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        DojoError::Io {
            message: message.into(),
            ctx: ErrorContext::none(),
            source: Some(source),
        }
    }
}

impl Diagnostic for DojoError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("dojo::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.ctx().span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Wraps snippet text for use as an error source.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a message-only `DojoError` variant.
#[macro_export]
macro_rules! err_msg {
    (Pattern, $($arg:tt)+) => {
        $crate::DojoError::Pattern {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    (InvalidRule, $($arg:tt)+) => {
        $crate::DojoError::InvalidRule {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    (Config, $($arg:tt)+) => {
        $crate::DojoError::Config {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    (Io, $($arg:tt)+) => {
        $crate::DojoError::Io {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $($arg:tt)+) => {
        $crate::DojoError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
        }
    };
}

/// Constructs a `DojoError` variant pointing at a span of snippet source.
/// Only for the variants without a `#[source]` field.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::DojoError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some(std::sync::Arc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::DojoError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(std::sync::Arc::clone($src), $span),
        }
    };
}
