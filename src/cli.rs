//! The `dojo` command-line tool.
//!
//! This module is the main entry point for all CLI commands and drives the
//! library the same way an embedding host would, through [`Engine`].

use std::io::Read;
use std::path::Path;
use std::process;

use clap::Parser;
use walkdir::WalkDir;

use crate::catalog::{load_exercise, DirectoryStore, ExerciseStore, InMemoryStore, EXERCISE_EXTENSIONS};
use crate::check::{self, CheckNode};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::errors::{DojoError, ErrorContext};
use crate::logging;

pub mod args;
pub mod output;

use args::{Command, DojoArgs};

/// Exit code for usage, I/O and authoring errors, as opposed to a failing grade.
pub const ERROR_EXIT_CODE: i32 = 2;

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = DojoArgs::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| exit_with_error(e)),
        None => EngineConfig::default(),
    };
    logging::init(config.log_filter.as_deref());

    match execute(args.command, &config) {
        Ok(code) => process::exit(code),
        Err(e) => exit_with_error(e),
    }
}

/// Runs one subcommand and returns the process exit code.
pub fn execute(command: Command, config: &EngineConfig) -> Result<i32, DojoError> {
    match command {
        Command::Validate {
            exercise,
            code,
            failures,
            lang,
            json,
        } => {
            let code = read_code(&code)?;
            let (engine, id) = engine_for(&exercise, config)?;
            let verdict = engine.validate(&id, &code, failures, lang.as_deref());
            if json {
                output::print_json(&verdict)?;
            } else {
                output::print_verdict(&verdict);
            }
            Ok(if verdict.passed { 0 } else { 1 })
        }

        Command::Exec {
            exercise,
            code,
            lang,
            json,
            command,
        } => {
            let code = read_code(&code)?;
            let (engine, id) = engine_for(&exercise, config)?;
            let response = engine.execute_command(&id, &command.join(" "), &code, lang.as_deref());
            if json {
                output::print_json(&response)?;
            } else {
                output::print_response(&response);
            }
            Ok(response.exit_code.clamp(0, 255))
        }

        Command::Check { check, code } => {
            let code = read_code(&code)?;
            let node = load_check(&check)?;
            let passed = check::evaluate(&node, &code)?;
            let reason = if passed { None } else { check::explain(&node, &code)? };
            output::print_check(passed, reason.as_deref());
            Ok(if passed { 0 } else { 1 })
        }

        Command::Lint { path } => lint_path(&path),
    }
}

// ============================================================================
// COMMAND HELPERS
// ============================================================================

/// Builds an engine that can see the requested exercise. A path to an
/// exercise file is loaded directly; anything else is an id looked up in
/// the configured exercise directory.
fn engine_for(
    exercise: &str,
    config: &EngineConfig,
) -> Result<(Engine<Box<dyn ExerciseStore>>, String), DojoError> {
    let path = Path::new(exercise);
    let (store, id): (Box<dyn ExerciseStore>, String) = if path.is_file() {
        let loaded = load_exercise(path)?;
        let id = loaded.id.clone();
        (Box::new(InMemoryStore::from_iter([loaded])), id)
    } else if let Some(dir) = &config.exercise_dir {
        (Box::new(DirectoryStore::new(dir)), exercise.to_string())
    } else {
        (Box::new(InMemoryStore::new()), exercise.to_string())
    };

    let engine = Engine::from_config(config, store);
    Ok((engine, id))
}

fn lint_path(root: &Path) -> Result<i32, DojoError> {
    let mut files = 0;
    let mut problems = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| DojoError::Io {
            message: format!("cannot walk {}: {e}", root.display()),
            ctx: ErrorContext::none(),
            source: e.into_io_error(),
        })?;
        if !entry.file_type().is_file() || !is_exercise_file(entry.path()) {
            continue;
        }

        files += 1;
        let display = entry.path().display().to_string();
        match load_exercise(entry.path()) {
            Ok(exercise) => {
                let findings = check::lint_exercise(&exercise);
                problems += findings.len();
                output::print_lint_findings(&display, findings);
            }
            Err(e) => {
                problems += 1;
                output::print_error(e);
            }
        }
    }

    output::print_lint_summary(files, problems);
    Ok(if problems == 0 { 0 } else { 1 })
}

fn is_exercise_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXERCISE_EXTENSIONS.contains(&ext))
}

fn load_check(path: &Path) -> Result<CheckNode, DojoError> {
    let text = read_file(path)?;
    serde_yaml::from_str(&text).map_err(|e| DojoError::InvalidRule {
        message: format!("{}: {e}", path.display()),
        ctx: ErrorContext::none(),
        source: Some(Box::new(e)),
    })
}

fn read_code(path: &Path) -> Result<String, DojoError> {
    if path.as_os_str() == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .map_err(|e| DojoError::io("cannot read code from stdin", e))?;
        return Ok(code);
    }
    read_file(path)
}

fn read_file(path: &Path) -> Result<String, DojoError> {
    std::fs::read_to_string(path).map_err(|e| DojoError::io(format!("cannot read {}", path.display()), e))
}

fn exit_with_error(error: DojoError) -> ! {
    output::print_error(error);
    process::exit(ERROR_EXIT_CODE);
}
