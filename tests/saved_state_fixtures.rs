use std::fs;
use std::path::Path;

use studydraw::engine::{AppState, Chapter, Priority, Syllabus};
use studydraw::store::json_store::JsonStore;
use tempfile::TempDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Places a fixture as the saved state of a fresh store and loads it.
fn load_fixture(name: &str) -> (TempDir, JsonStore, AppState) {
    let dir = TempDir::new().unwrap();
    let src = Path::new(FIXTURES).join(name);
    fs::copy(&src, dir.path().join("state.json"))
        .unwrap_or_else(|e| panic!("Failed to copy {}: {e}", src.display()));
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let state = store.load_state(&Syllabus::default());
    (dir, store, state)
}

fn names(state: &AppState, subject: &str) -> Vec<String> {
    state
        .list_chapters(subject)
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

#[test]
fn test_legacy_names_load_as_medium() {
    let (_dir, _store, state) = load_fixture("01-legacy-names.json");

    assert_eq!(names(&state, "Physics"), vec!["Gravitation", "EMI", "AC", "Fluids"]);
    assert!(
        state
            .list_chapters("Physics")
            .iter()
            .all(|c| c.priority == Priority::Medium)
    );
    assert!(state.is_completed("Physics", "Gravitation"));
    assert!(state.is_completed("Chemistry", "Mole Concept"));

    let totals = state.totals();
    assert_eq!((totals.total, totals.done, totals.percent), (9, 3, 33));
}

#[test]
fn test_prioritised_record_keeps_priorities() {
    let (_dir, _store, state) = load_fixture("02-prioritised.json");

    assert_eq!(
        state.list_chapters("Physics"),
        &[
            Chapter::new("Gravitation", Priority::High),
            Chapter::new("Optics", Priority::Low),
        ]
    );
    assert_eq!(
        state.list_chapters("Mathematics")[2],
        Chapter::new("Parabola", Priority::Medium)
    );
    // An explicitly empty subject stays empty rather than reverting to defaults
    assert!(state.list_chapters("Chemistry").is_empty());
    assert_eq!(state.totals().percent, 20);
}

#[test]
fn test_bad_subject_entries_fall_back_individually() {
    let (_dir, _store, state) = load_fixture("03-one-bad-subject.json");
    let defaults = Syllabus::default();

    assert_eq!(
        state.list_chapters("Physics"),
        &[Chapter::new("Gravitation", Priority::High)]
    );
    assert!(state.is_completed("Physics", "Gravitation"));
    assert_eq!(
        state.list_chapters("Mathematics"),
        defaults.defaults_for("Mathematics").unwrap()
    );
    assert_eq!(
        state.list_chapters("Chemistry"),
        defaults.defaults_for("Chemistry").unwrap()
    );
    assert_eq!(state.completed().count("Chemistry"), 0);
    assert!(state.list_chapters("Biology").is_empty());
    assert_eq!(state.subjects().count(), 3);
}

#[test]
fn test_truncated_record_is_kept_aside() {
    let (dir, store, state) = load_fixture("04-truncated.json");

    assert_eq!(state, Syllabus::default().initial_state());
    let corrupt = dir.path().join("state.json.corrupt");
    assert_eq!(
        fs::read(&corrupt).unwrap(),
        fs::read(Path::new(FIXTURES).join("04-truncated.json")).unwrap()
    );

    // The next save replaces the broken record but not the copy
    store.save_state(&state).unwrap();
    assert_eq!(store.load_state(&Syllabus::default()), state);
    assert!(corrupt.exists());
}

#[test]
fn test_every_fixture_survives_a_save_cycle() {
    for name in [
        "01-legacy-names.json",
        "02-prioritised.json",
        "03-one-bad-subject.json",
        "04-truncated.json",
    ] {
        let (_dir, store, state) = load_fixture(name);
        store.save_state(&state).unwrap();
        assert_eq!(
            store.load_state(&Syllabus::default()),
            state,
            "{name}: state changed across save and load"
        );
    }
}
