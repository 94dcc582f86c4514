//! Exercise lookup and caching.
//!
//! The engine never loads exercises itself. It asks an [`ExerciseStore`] by
//! id, through an [`ExerciseCache`] it was constructed with. Stores and
//! clocks are plain trait objects so hosts and tests can substitute their
//! own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::errors::{DojoError, ErrorContext};
use crate::exercise::Exercise;

// ============================================================================
// STORES
// ============================================================================

/// Source of hydrated exercises.
pub trait ExerciseStore: Send + Sync {
    fn get_exercise(&self, id: &str) -> Option<Exercise>;
}

impl<T: ExerciseStore + ?Sized> ExerciseStore for Arc<T> {
    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        (**self).get_exercise(id)
    }
}

impl<T: ExerciseStore + ?Sized> ExerciseStore for Box<T> {
    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        (**self).get_exercise(id)
    }
}

/// Exercises held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    exercises: Vec<Exercise>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exercise, replacing any with the same id.
    pub fn insert(&mut self, exercise: Exercise) {
        match self.exercises.iter_mut().find(|e| e.id == exercise.id) {
            Some(slot) => *slot = exercise,
            None => self.exercises.push(exercise),
        }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl FromIterator<Exercise> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = Exercise>>(iter: I) -> Self {
        let mut store = Self::new();
        for exercise in iter {
            store.insert(exercise);
        }
        store
    }
}

impl ExerciseStore for InMemoryStore {
    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        self.exercises.iter().find(|e| e.id == id).cloned()
    }
}

/// Exercises stored one per file as `<dir>/<id>.json`, `.yaml` or `.yml`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

pub const EXERCISE_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.contains("..");
        if !safe {
            return None;
        }
        EXERCISE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{id}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl ExerciseStore for DirectoryStore {
    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        let path = self.path_for(id)?;
        match load_exercise(&path) {
            Ok(exercise) => Some(exercise),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load exercise");
                None
            }
        }
    }
}

/// Reads one exercise file. JSON for `.json`, YAML otherwise.
pub fn load_exercise(path: impl AsRef<Path>) -> Result<Exercise, DojoError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| DojoError::io(format!("cannot read {}", path.display()), e))?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed: Result<Exercise, Box<dyn std::error::Error + Send + Sync>> = if is_json {
        serde_json::from_str(&text).map_err(Into::into)
    } else {
        serde_yaml::from_str(&text).map_err(Into::into)
    };

    parsed.map_err(|e| DojoError::InvalidRule {
        message: format!("{}: {e}", path.display()),
        ctx: ErrorContext::none(),
        source: Some(e),
    })
}

// ============================================================================
// CLOCKS
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ============================================================================
// CACHE
// ============================================================================

struct CachedExercise {
    exercise: Arc<Exercise>,
    fetched_at: Instant,
}

/// A TTL cache in front of a store. Reads take a shared lock; only misses
/// and invalidation take the write lock.
///
/// Store fetches run outside the lock. A fetch that overlaps an invalidation
/// is returned to its caller but not cached.
pub struct ExerciseCache<S, C = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedExercise>>,
    /// Bumped under the write lock by every invalidation.
    generation: AtomicU64,
}

impl<S: ExerciseStore> ExerciseCache<S, SystemClock> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, SystemClock)
    }
}

impl<S: ExerciseStore, C: Clock> ExerciseCache<S, C> {
    pub fn with_clock(store: S, ttl: Duration, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh cached copy, or the store's current one. Ids the store does
    /// not know are not cached.
    pub fn get(&self, id: &str) -> Option<Arc<Exercise>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = entries.get(id) {
                if now.saturating_duration_since(cached.fetched_at) < self.ttl {
                    return Some(Arc::clone(&cached.exercise));
                }
            }
        }

        debug!(exercise = id, "exercise cache miss");
        let generation = self.generation.load(Ordering::Acquire);
        let fetched = self.store.get_exercise(id).map(Arc::new);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(exercise = id, "invalidated during fetch; not caching");
            return fetched;
        }
        match &fetched {
            Some(exercise) => {
                entries.insert(
                    id.to_string(),
                    CachedExercise {
                        exercise: Arc::clone(exercise),
                        fetched_at: now,
                    },
                );
            }
            None => {
                entries.remove(id);
            }
        }
        fetched
    }

    pub fn invalidate(&self, id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(id);
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn cached_len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
