mod common;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{pod_exercise, store, POD, POD_EXERCISE};
use dojo::catalog::{ExerciseCache, ManualClock};
use dojo::engine::UNKNOWN_EXERCISE_EXIT_CODE;
use dojo::locale::Locales;
use dojo::{DirectoryStore, Engine, EngineConfig, Exercise, ExerciseStore, InMemoryStore};

/// A store whose contents can change underneath the engine.
#[derive(Default)]
struct EditableStore {
    exercise: std::sync::Mutex<Option<Exercise>>,
    fetches: AtomicUsize,
}

impl EditableStore {
    fn set(&self, exercise: Exercise) {
        *self.exercise.lock().unwrap() = Some(exercise);
    }
}

impl ExerciseStore for EditableStore {
    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.exercise.lock().unwrap().clone().filter(|e| e.id == id)
    }
}

fn editable_engine() -> (Arc<EditableStore>, Arc<ManualClock>, Engine<Arc<EditableStore>, Arc<ManualClock>>) {
    let store = Arc::new(EditableStore::default());
    store.set(pod_exercise());
    let clock = Arc::new(ManualClock::default());
    let cache = ExerciseCache::with_clock(Arc::clone(&store), Duration::from_secs(300), Arc::clone(&clock));
    (store, clock, Engine::with_cache(cache, Locales::default()))
}

fn renamed(message: &str) -> Exercise {
    let mut exercise = pod_exercise();
    exercise.success_message = message.to_string();
    exercise
}

#[test]
fn validates_and_routes_known_exercises() {
    let engine = Engine::new(store(), Duration::from_secs(60));
    let verdict = engine.validate("pod-basics", POD, 0, None);
    assert!(verdict.passed);
    assert_eq!(verdict.summary, "Pod manifest looks good!");

    let response = engine.execute_command("pod-basics", "kubectl get pods", POD, Some("es"));
    assert_eq!(response.exit_code, 0);
    assert!(response.output.starts_with("NAME"));
}

#[test]
fn unknown_exercises_get_localized_not_found() {
    let engine = Engine::new(InMemoryStore::new(), Duration::from_secs(60));

    let verdict = engine.validate("nope", POD, 5, Some("es-MX"));
    assert!(!verdict.passed);
    assert!(verdict.results.is_empty());
    assert_eq!(verdict.summary, "Ejercicio no encontrado");
    assert_eq!(verdict.hints_used, 0);
    assert_eq!(verdict.next_hint, None);

    let wire = serde_json::to_value(&verdict).unwrap();
    assert_eq!(
        wire,
        serde_json::json!({ "passed": false, "results": [], "summary": "Ejercicio no encontrado", "hintsUsed": 0 })
    );

    let response = engine.execute_command("nope", "ls", POD, None);
    assert_eq!(response.output, "Exercise not found");
    assert_eq!(response.exit_code, UNKNOWN_EXERCISE_EXIT_CODE);
}

#[test]
fn cached_exercises_expire_after_the_ttl() {
    let (store, clock, engine) = editable_engine();
    assert_eq!(engine.validate("pod-basics", POD, 0, None).summary, "Pod manifest looks good!");

    store.set(renamed("Edited!"));
    clock.advance(Duration::from_secs(299));
    assert_eq!(engine.validate("pod-basics", POD, 0, None).summary, "Pod manifest looks good!");

    clock.advance(Duration::from_secs(1));
    assert_eq!(engine.validate("pod-basics", POD, 0, None).summary, "Edited!");
    assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn invalidation_picks_up_edits_immediately() {
    let (store, _clock, engine) = editable_engine();
    engine.validate("pod-basics", POD, 0, None);

    store.set(renamed("Edited!"));
    engine.invalidate("pod-basics");
    assert_eq!(engine.validate("pod-basics", POD, 0, None).summary, "Edited!");

    store.set(renamed("Edited again!"));
    engine.invalidate_all();
    assert_eq!(engine.exercise("pod-basics").unwrap().success_message, "Edited again!");
}

#[test]
fn from_config_wires_ttl_and_messages() {
    let config = EngineConfig::from_yaml_str("default_lang: fr\ncache_ttl_secs: 1\nmessages:\n  it: Esercizio non trovato\n").unwrap();
    let engine = Engine::from_config(&config, InMemoryStore::new());
    assert_eq!(engine.validate("x", "", 0, Some("it")).summary, "Esercizio non trovato");
    assert_eq!(engine.validate("x", "", 0, Some("ja")).summary, "Exercice introuvable");
    assert_eq!(engine.validate("x", "", 0, None).summary, "Exercice introuvable");
}

#[test]
fn directory_store_reads_json_and_yaml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pod-basics.json"), POD_EXERCISE).unwrap();
    fs::write(
        dir.path().join("hello.yaml"),
        "id: hello\nvalidations:\n  - type: syntax\n    check: { contains: hello }\n    errorMessage: greet\n    failMessage: Say hello.\nsuccessMessage: Hi!\n",
    )
    .unwrap();
    fs::write(dir.path().join("broken.yml"), "id: [").unwrap();

    let engine = Engine::new(DirectoryStore::new(dir.path()), Duration::from_secs(60));
    assert!(engine.validate("pod-basics", POD, 0, None).passed);
    assert_eq!(engine.validate("hello", "hello world", 0, None).summary, "Hi!");
    assert_eq!(engine.validate("hello", "bye", 0, None).summary, "Say hello.");
    assert_eq!(engine.validate("broken", "", 0, None).summary, "Exercise not found");
    assert_eq!(engine.validate("../pod-basics", "", 0, None).summary, "Exercise not found");
}

#[test]
fn engine_is_shared_across_threads() {
    let engine = Arc::new(Engine::new(store(), Duration::from_secs(60)));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let code = if i % 2 == 0 { POD.to_string() } else { String::new() };
                engine.validate("pod-basics", &code, i, None).passed
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, [true, false, true, false, true, false, true, false]);
}
