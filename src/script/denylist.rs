//! Static denylist screen for custom snippets.
//!
//! Snippets mentioning any of these identifiers as a whole word are rejected
//! before parsing. The list is a stable contract with authored content.
//!
//! This is a best-effort guard and not a security boundary. The interpreter
//! exposes no host bindings at all, so none of these names would resolve
//! anyway; the screen exists so that content relying on it keeps being
//! rejected the same way.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{DojoError, SourceArc};
use crate::script::ast::Span;
use crate::err_ctx;

pub const DENIED_IDENTIFIERS: &[&str] = &[
    "require",
    "import",
    "process",
    "child_process",
    "global",
    "globalThis",
    "fs",
    "fetch",
    "XMLHttpRequest",
    "WebSocket",
    "eval",
    "Function",
    "constructor",
    "setTimeout",
    "setInterval",
    "setImmediate",
];

static DENYLIST: Lazy<Regex> = Lazy::new(|| {
    let alternation = DENIED_IDENTIFIERS
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    // Identifiers may contain `$`, which `\b` treats as a boundary.
    Regex::new(&format!(r"(?:^|[^A-Za-z0-9_$])({alternation})(?:$|[^A-Za-z0-9_$])"))
        .expect("denylist pattern is valid")
});

/// Rejects a snippet that mentions a denied identifier.
pub fn screen(snippet: &str, source: &SourceArc) -> Result<(), DojoError> {
    let Some(found) = DENYLIST.captures(snippet).and_then(|caps| caps.get(1)) else {
        return Ok(());
    };
    Err(err_ctx!(
        Denied,
        format!("`{}` is not allowed in custom checks", found.as_str()),
        source,
        Span {
            start: found.start(),
            end: found.end(),
        },
        "custom checks can only use `code`, the document helpers and plain values"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{to_error_source, ErrorType};

    fn screen_text(snippet: &str) -> Result<(), DojoError> {
        screen(snippet, &to_error_source("custom check", snippet))
    }

    #[test]
    fn rejects_every_listed_identifier() {
        for name in DENIED_IDENTIFIERS {
            let snippet = format!("return {name}.x");
            let err = screen_text(&snippet).unwrap_err();
            assert_eq!(err.error_type(), ErrorType::Denied, "{name} should be denied");
        }
    }

    #[test]
    fn matches_whole_words_only() {
        assert!(screen_text("code.includes('fsGroup')").is_ok());
        assert!(screen_text("const processes = 1; processes > 0").is_ok());
        assert!(screen_text("return requirements").is_ok());
        assert!(screen_text("code.includes(\"$fs\")").is_ok());
    }

    #[test]
    fn matches_inside_strings_too() {
        // The screen is textual: quoting a denied word does not hide it.
        assert!(screen_text("code.includes('process')").is_err());
        assert!(screen_text("x.constructor").is_err());
    }
}
