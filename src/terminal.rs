//! Terminal command routing.
//!
//! A typed command is trimmed and matched against the exercise's command
//! patterns in one pass, in declaration order. The first pattern that equals
//! the typed command, or where either string is a prefix of the other, is
//! selected, so `kubectl logs my-pod` reaches `kubectl logs`. When nothing
//! matches, the built-ins apply (`help`/`?`, `clear`, empty input), and
//! anything else is "command not found" with exit code 127.
//!
//! The prefix rule is deliberately loose. When two patterns are prefixes of
//! one another, whichever is declared first wins, even if the typed command
//! equals the later one exactly. Empty input is a prefix of every pattern, so
//! it selects the first pattern when any exist.

use serde::Serialize;
use tracing::debug;

use crate::exercise::Exercise;
use crate::rules::ResponseHandler;

pub const COMMAND_NOT_FOUND_EXIT_CODE: i32 = 127;

/// Simulated command output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResponse {
    pub output: String,
    pub exit_code: i32,
    /// Asks the terminal to reset its screen.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub clear: bool,
}

impl TerminalResponse {
    pub fn new(output: String, exit_code: i32) -> Self {
        Self {
            output,
            exit_code,
            clear: false,
        }
    }

    pub fn cleared() -> Self {
        Self {
            clear: true,
            ..Self::default()
        }
    }
}

/// How a typed command was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Exact(&'a str),
    Prefix(&'a str),
    Help,
    Clear,
    Empty,
    NotFound,
}

pub struct CommandRouter<'a> {
    routes: Vec<(&'a str, ResponseHandler<'a>)>,
}

impl<'a> CommandRouter<'a> {
    pub fn new(exercise: &'a Exercise) -> Self {
        let routes = exercise
            .terminal_commands
            .iter()
            .map(|(pattern, entries)| (pattern.as_str(), ResponseHandler::hydrate(entries)))
            .collect();
        Self { routes }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.routes.iter().map(|(pattern, _)| *pattern)
    }

    /// Resolves a typed command without running any response logic.
    pub fn resolve(&self, typed: &str) -> Route<'a> {
        let typed = typed.trim();

        let selected = self.patterns().find(|pattern| {
            *pattern == typed || typed.starts_with(pattern) || pattern.starts_with(typed)
        });
        match selected {
            Some(pattern) if pattern == typed => return Route::Exact(pattern),
            Some(pattern) => return Route::Prefix(pattern),
            None => {}
        }

        match typed {
            "help" | "?" => Route::Help,
            "clear" => Route::Clear,
            "" => Route::Empty,
            _ => Route::NotFound,
        }
    }

    pub fn route(&self, typed: &str, source: &str) -> TerminalResponse {
        let route = self.resolve(typed);
        debug!(command = typed, ?route, "routed terminal command");

        match route {
            Route::Exact(pattern) | Route::Prefix(pattern) => self.handler(pattern).respond(source),
            Route::Help => TerminalResponse::new(self.help_text(), 0),
            Route::Clear => TerminalResponse::cleared(),
            Route::Empty => TerminalResponse::default(),
            Route::NotFound => {
                let command = typed.split_whitespace().next().unwrap_or_default();
                TerminalResponse::new(
                    format!("{command}: command not found"),
                    COMMAND_NOT_FOUND_EXIT_CODE,
                )
            }
        }
    }

    fn handler(&self, pattern: &str) -> ResponseHandler<'a> {
        self.routes
            .iter()
            .find(|(candidate, _)| *candidate == pattern)
            .map(|(_, handler)| *handler)
            .unwrap_or_else(|| ResponseHandler::hydrate(&[]))
    }

    fn help_text(&self) -> String {
        let mut text = String::from("Available commands:");
        for pattern in self.patterns().chain(["clear", "help"]) {
            text.push_str("\n  ");
            text.push_str(pattern);
        }
        text
    }
}

/// Routes one typed command for an exercise.
pub fn route(exercise: &Exercise, typed: &str, source: &str) -> TerminalResponse {
    CommandRouter::new(exercise).route(typed, source)
}
