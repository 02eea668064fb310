//! Integration tests for the calendar, navigation state, and history.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn env_with_theme() -> TestEnv {
    let env = TestEnv::init();
    env.bearing()
        .args(["theme", "create", "Health", "--color", "#22aa44", "--id", "H"])
        .assert()
        .success();
    env
}

#[test]
fn test_calendar_set_show_clear() {
    let env = env_with_theme();

    let day = env.json(&[
        "calendar", "set", "2026-03-14", "--theme", "H", "--text", "Long run",
    ]);
    assert_eq!(day["date"], "2026-03-14");
    assert_eq!(day["themeId"], "H");
    assert!(env.tracked_files().contains(&"calendar/2026.json".to_string()));
    assert_eq!(env.commit_messages()[0], "Set focus for 2026-03-14");

    env.json(&["calendar", "set", "2026-01-02", "--text", "Rest"]);
    let year = env.json(&["calendar", "show", "2026"]);
    let entries = year["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], "2026-01-02");

    let cleared = env.json(&["calendar", "clear", "2026-03-14"]);
    assert_eq!(cleared["cleared"], true);
    let again = env.json(&["calendar", "clear", "2026-03-14"]);
    assert_eq!(again["cleared"], false);
}

#[test]
fn test_calendar_rejects_unknown_theme() {
    let env = env_with_theme();

    env.bearing()
        .args(["calendar", "set", "2026-03-14", "--theme", "Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Theme not found: Z"));
}

#[test]
fn test_calendar_empty_year() {
    let env = TestEnv::init();

    env.bearing()
        .args(["calendar", "show", "2031", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No focus entries for 2031."));
}

#[test]
fn test_navigation_is_not_versioned() {
    let env = env_with_theme();
    let commits_before = env.commit_messages().len();

    let nav = env.json(&[
        "nav",
        "set",
        "--view",
        "okr",
        "--theme",
        "H",
        "--expanded",
        "H-O1,H-O2",
    ]);
    assert_eq!(nav["currentView"], "okr");
    assert_eq!(nav["filterThemeId"], "H");
    assert!(nav.get("lastAccessed").is_some());

    let shown = env.json(&["nav", "show"]);
    assert_eq!(shown["expandedOkrIds"][1], "H-O2");

    assert!(env.data_path().join("navigation_context.json").exists());
    assert!(!env
        .tracked_files()
        .contains(&"navigation_context.json".to_string()));
    assert_eq!(env.commit_messages().len(), commits_before);
}

#[test]
fn test_history_lists_newest_first() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);

    let history = env.json(&["history", "-n", "2"]);
    assert_eq!(history["count"], 2);
    assert_eq!(history["commits"][0]["message"], "Create objective H-O1: Run a marathon");
    assert_eq!(history["commits"][1]["message"], "Create theme H (Health)");
    assert_eq!(history["commits"][0]["id"].as_str().unwrap().len(), 40);
}

#[test]
fn test_board_layout() {
    let env = TestEnv::init();

    let board = env.json(&["board"]);
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0]["status"], "todo");
    assert_eq!(columns[0]["sections"].as_array().unwrap().len(), 3);
    assert_eq!(columns[2]["status"], "done");
}
