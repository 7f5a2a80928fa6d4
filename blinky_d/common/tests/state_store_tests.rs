use std::fs;
use std::path::{Path, PathBuf};

use common::state_store::{PersistedState, StateStore};
use common::{BlinkStats, ReminderMode};

fn get_test_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("blinky_test_{}", name));
    path
}

fn cleanup_test_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

#[test]
fn test_state_round_trips_through_disk() {
    let dir = get_test_dir("state_round_trip");
    cleanup_test_dir(&dir);

    let path = dir.join("nested").join("state.json");
    let mut store = StateStore::new(path.clone());
    store.set_mode(Some(ReminderMode::Gentle));
    store.record_stats(BlinkStats {
        total_blinks: 42,
        blinks_per_minute: 9,
        time_since_last_blink_ms: Some(1_250),
        ear: Some(0.28),
    });
    assert!(store.is_dirty());
    store.save().expect("save should create parent dirs");
    assert!(!store.is_dirty());

    let mut reloaded = StateStore::new(path);
    reloaded.load().expect("load should succeed");
    assert_eq!(reloaded.state, store.state);

    cleanup_test_dir(&dir);
}

#[test]
fn test_non_finite_ear_is_dropped_on_save() {
    let dir = get_test_dir("state_non_finite");
    cleanup_test_dir(&dir);
    let path = dir.join("state.json");

    let mut store = StateStore::new(path.clone());
    store.record_stats(BlinkStats {
        ear: Some(f32::NAN),
        ..Default::default()
    });
    store.save().expect("save should succeed");

    let contents = fs::read_to_string(&path).expect("file should exist");
    let json: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
    assert!(json["stats"]["ear"].is_null());

    cleanup_test_dir(&dir);
}

#[test]
fn test_missing_file_keeps_defaults() {
    let dir = get_test_dir("state_missing");
    cleanup_test_dir(&dir);

    let mut store = StateStore::new(dir.join("absent.json"));
    assert!(store.load().is_ok());
    assert_eq!(store.state, PersistedState::default());
}

#[test]
fn test_unchanged_mode_is_not_dirty() {
    let mut store = StateStore::new(PathBuf::from("unused.json"));
    store.set_mode(None);
    assert!(!store.is_dirty());
    store.set_mode(Some(ReminderMode::Strict));
    assert!(store.is_dirty());
}
