//! Dojo: a check engine for grading exercise submissions.
//!
//! An exercise carries validation rules and simulated terminal commands,
//! both written in a small declarative check language evaluated against the
//! learner's submitted text. The [`Engine`] grades submissions, reveals hints
//! as failures accumulate and answers terminal commands.
//!
//! Every grading function is a pure function of its inputs; the only shared
//! state is the exercise cache inside [`Engine`].

pub use crate::errors::{DojoError, ErrorContext, ErrorType};

pub mod catalog;
pub mod check;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod exercise;
pub mod grading;
pub mod locale;
pub mod logging;
pub mod rules;
pub mod script;
pub mod terminal;

pub use crate::catalog::{DirectoryStore, ExerciseCache, ExerciseStore, InMemoryStore};
pub use crate::check::{evaluate, CheckNode};
pub use crate::config::EngineConfig;
pub use crate::engine::Engine;
pub use crate::exercise::{Exercise, RuleKind, TerminalResponseEntry, ValidationRule};
pub use crate::grading::{validate, ValidationVerdict};
pub use crate::script::{run_custom, CustomResult};
pub use crate::terminal::{route, TerminalResponse};
