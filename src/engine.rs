//! The public facade: cached exercise lookup in front of grading and terminal routing.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{Clock, ExerciseCache, ExerciseStore, SystemClock};
use crate::config::EngineConfig;
use crate::exercise::Exercise;
use crate::grading::{self, ValidationVerdict};
use crate::locale::Locales;
use crate::terminal::{self, TerminalResponse};

// ============================================================================
// ENGINE - Public entry points
// ============================================================================

/// Exit code for a command run against an unknown exercise.
pub const UNKNOWN_EXERCISE_EXIT_CODE: i32 = 1;

/// The grading engine: exercise lookup plus the pure grading and routing
/// functions. Shareable across threads when its store and clock are.
pub struct Engine<S, C = SystemClock> {
    cache: ExerciseCache<S, C>,
    locales: Locales,
}

impl<S: ExerciseStore> Engine<S, SystemClock> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self::with_cache(ExerciseCache::new(store, ttl), Locales::default())
    }

    /// Wires the cache TTL and locale table from configuration.
    pub fn from_config(config: &EngineConfig, store: S) -> Self {
        Self::with_cache(ExerciseCache::new(store, config.cache_ttl()), config.locales())
    }
}

impl<S: ExerciseStore, C: Clock> Engine<S, C> {
    pub fn with_cache(cache: ExerciseCache<S, C>, locales: Locales) -> Self {
        Self { cache, locales }
    }

    pub fn exercise(&self, id: &str) -> Option<Arc<Exercise>> {
        self.cache.get(id)
    }

    /// Grades a submission. Unknown ids produce a failed verdict carrying the
    /// localized not-found text.
    pub fn validate(
        &self,
        exercise_id: &str,
        code: &str,
        failure_count: u32,
        lang: Option<&str>,
    ) -> ValidationVerdict {
        match self.cache.get(exercise_id) {
            Some(exercise) => grading::validate(&exercise, code, failure_count),
            None => ValidationVerdict::not_found(self.locales.not_found(lang)),
        }
    }

    /// Simulates a terminal command against the learner's current code.
    pub fn execute_command(
        &self,
        exercise_id: &str,
        command: &str,
        code: &str,
        lang: Option<&str>,
    ) -> TerminalResponse {
        match self.cache.get(exercise_id) {
            Some(exercise) => terminal::route(&exercise, command, code),
            None => TerminalResponse::new(
                self.locales.not_found(lang).to_string(),
                UNKNOWN_EXERCISE_EXIT_CODE,
            ),
        }
    }

    /// Drops a cached exercise after it was edited.
    pub fn invalidate(&self, exercise_id: &str) {
        self.cache.invalidate(exercise_id);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
