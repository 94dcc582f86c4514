//! Defines the command-line arguments and subcommands for the Dojo CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "dojo",
    version,
    about = "Grade exercise submissions and simulate terminal commands."
)]
pub struct DojoArgs {
    /// Engine configuration file (YAML).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grade a submission against an exercise.
    Validate {
        /// Exercise file, or an exercise id under the configured exercise_dir.
        exercise: String,
        /// Submitted code; `-` reads stdin.
        #[arg(long, value_name = "FILE")]
        code: PathBuf,
        /// Number of failed attempts so far (drives hints).
        #[arg(long, default_value_t = 0)]
        failures: u32,
        /// Language for the "exercise not found" message.
        #[arg(long)]
        lang: Option<String>,
        /// Print the verdict as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Simulate a terminal command against a submission.
    Exec {
        /// Exercise file, or an exercise id under the configured exercise_dir.
        exercise: String,
        /// Submitted code; `-` reads stdin.
        #[arg(long, value_name = "FILE")]
        code: PathBuf,
        /// Language for the "exercise not found" message.
        #[arg(long)]
        lang: Option<String>,
        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
        /// The command as typed, e.g. `kubectl get pods`.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Evaluate a single check against a submission and explain a failure.
    Check {
        /// File holding one check object (JSON or YAML).
        check: PathBuf,
        /// Submitted code; `-` reads stdin.
        #[arg(long, value_name = "FILE")]
        code: PathBuf,
    },
    /// Report broken regexes and snippets in exercise files.
    Lint {
        /// An exercise file or a directory to search.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
