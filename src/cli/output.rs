//! Handles all user-facing output for the CLI.
//!
//! Colored text goes through `termcolor`, JSON through `serde_json`, and
//! errors through `miette` reports on stderr.

use std::io::Write;

use miette::Report;
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::check::LintFinding;
use crate::errors::DojoError;
use crate::grading::ValidationVerdict;
use crate::terminal::TerminalResponse;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints a verdict rule by rule, then the summary and any hint.
pub fn print_verdict(verdict: &ValidationVerdict) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    for result in &verdict.results {
        if result.passed {
            write_colored(&mut stdout, Color::Green, "✓ ");
            let _ = writeln!(stdout, "{}", result.kind);
        } else {
            write_colored(&mut stdout, Color::Red, "✗ ");
            let _ = writeln!(
                stdout,
                "{}: {}",
                result.kind,
                result.error_message.as_deref().unwrap_or_default()
            );
        }
    }

    if !verdict.results.is_empty() {
        let _ = writeln!(stdout);
    }
    let color = if verdict.passed { Color::Green } else { Color::Red };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = writeln!(stdout, "{}", verdict.summary);
    let _ = stdout.reset();

    if let Some(hint) = &verdict.next_hint {
        let _ = writeln!(stdout);
        write_colored(&mut stdout, Color::Yellow, &format!("Hint {}: ", verdict.hints_used));
        let _ = writeln!(stdout, "{hint}");
    }
}

/// Prints simulated command output exactly as a terminal would show it.
pub fn print_response(response: &TerminalResponse) {
    if response.clear {
        print!("\x1b[2J\x1b[H");
    }
    if !response.output.is_empty() {
        println!("{}", response.output);
    }
}

pub fn print_check(passed: bool, reason: Option<&str>) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if passed {
        write_colored(&mut stdout, Color::Green, "pass");
        let _ = writeln!(stdout);
    } else {
        write_colored(&mut stdout, Color::Red, "fail");
        match reason {
            Some(reason) => {
                let _ = writeln!(stdout, ": {reason}");
            }
            None => {
                let _ = writeln!(stdout);
            }
        }
    }
}

/// Prints one file's lint findings as diagnostics on stderr.
pub fn print_lint_findings(file: &str, findings: Vec<LintFinding>) {
    for finding in findings {
        eprintln!("{file}: {}", finding.location);
        print_error(finding.error);
    }
}

pub fn print_lint_summary(files: usize, findings: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let color = if findings == 0 { Color::Green } else { Color::Red };
    write_colored(
        &mut stdout,
        color,
        &format!("{files} exercise file(s) checked, {findings} problem(s) found"),
    );
    let _ = writeln!(stdout);
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), DojoError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| DojoError::InvalidRule {
        message: format!("cannot serialize output: {e}"),
        ctx: crate::errors::ErrorContext::none(),
        source: Some(Box::new(e)),
    })?;
    println!("{text}");
    Ok(())
}

pub fn print_error(error: DojoError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_colored(stdout: &mut StandardStream, color: Color, text: &str) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stdout, "{text}");
    let _ = stdout.reset();
}
