//! Integration tests for themes, objectives, and key results via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn env_with_theme() -> TestEnv {
    let env = TestEnv::init();
    env.bearing()
        .args(["theme", "create", "Health", "--color", "#22aa44"])
        .assert()
        .success();
    env
}

#[test]
fn test_theme_create_derives_id() {
    let env = TestEnv::init();

    let theme = env.json(&["theme", "create", "Health", "--color", "#22aa44"]);
    assert_eq!(theme["id"], "H");
    assert_eq!(theme["name"], "Health");

    // Second theme with the same initial gets a different abbreviation
    let other = env.json(&["theme", "create", "Hobbies", "--color", "#aa2244"]);
    assert_ne!(other["id"], "H");

    assert!(env.commit_messages().contains(&"Create theme H (Health)".to_string()));
}

#[test]
fn test_theme_create_rejects_bad_color() {
    let env = TestEnv::init();

    env.bearing()
        .args(["theme", "create", "Health", "--color", "green"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_theme_list_human() {
    let env = env_with_theme();
    env.bearing()
        .args(["objective", "create", "H", "Run a marathon"])
        .assert()
        .success();

    env.bearing()
        .args(["theme", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H  Health (#22aa44)"))
        .stdout(predicate::str::contains("H-O1 [active] Run a marathon"));
}

#[test]
fn test_theme_suggest() {
    let env = env_with_theme();

    let suggestion = env.json(&["theme", "suggest", "Health Admin"]);
    assert_eq!(suggestion["name"], "Health Admin");
    let abbreviation = suggestion["abbreviation"].as_str().unwrap();
    assert_ne!(abbreviation, "H");
    assert!(abbreviation.chars().all(|c| c.is_ascii_uppercase()));
}

#[test]
fn test_objective_ids_are_theme_scoped() {
    let env = env_with_theme();

    let first = env.json(&["objective", "create", "H", "Run a marathon"]);
    let nested = env.json(&["objective", "create", "H-O1", "Build a base"]);
    assert_eq!(first["id"], "H-O1");
    assert_eq!(nested["id"], "H-O2");
    assert_eq!(nested["parentId"], "H-O1");

    env.bearing()
        .args(["objective", "create", "Z", "Orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_objective_move_rejects_cycle() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);
    env.json(&["objective", "create", "H-O1", "Build a base"]);

    env.bearing()
        .args(["objective", "move", "H-O1", "H-O2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-objective-cycle"));

    let moved = env.json(&["objective", "move", "H-O2", "H"]);
    assert_eq!(moved["parentId"], "H");
}

#[test]
fn test_completion_blocked_by_open_key_result() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);
    env.json(&["kr", "create", "H-O1", "Sign up for a race"]);

    env.bearing()
        .args(["objective", "status", "H-O1", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("H-KR1"));

    env.json(&["kr", "status", "H-KR1", "completed"]);
    let done = env.json(&["objective", "status", "H-O1", "completed"]);
    assert_eq!(done["status"], "completed");
}

#[test]
fn test_invalid_status_transition() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);

    env.bearing()
        .args(["objective", "status", "H-O1", "archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status transition"));
}

#[test]
fn test_key_result_progress() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);

    let kr = env.json(&[
        "kr", "create", "H-O1", "Weekly km", "--start", "10", "--target", "50",
    ]);
    assert_eq!(kr["id"], "H-KR1");
    assert_eq!(kr["kind"], "numeric");
    assert_eq!(kr["currentValue"], 10);

    let kr = env.json(&["kr", "progress", "H-KR1", "30"]);
    assert_eq!(kr["currentValue"], 30);
    assert_eq!(kr["progress"], 0.5);

    let kr = env.json(&["kr", "update", "H-KR1", "--target", "0"]);
    assert_eq!(kr["kind"], "untracked");
    assert!(kr.get("progress").is_none());
}

#[test]
fn test_delete_objective_removes_subtree() {
    let env = env_with_theme();
    env.json(&["objective", "create", "H", "Run a marathon"]);
    env.json(&["objective", "create", "H-O1", "Build a base"]);
    env.json(&["kr", "create", "H-O2", "Run 30 km weeks"]);

    let deleted = env.json(&["objective", "delete", "H-O1"]);
    assert_eq!(deleted["deleted"], true);

    let theme = env.json(&["theme", "show", "H"]);
    assert_eq!(theme["objectives"].as_array().unwrap().len(), 0);

    env.bearing()
        .args(["kr", "progress", "H-KR1", "1"])
        .assert()
        .failure();
}

#[test]
fn test_theme_save_from_stdin() {
    let env = env_with_theme();
    let doc = r##"{
        "id": "H",
        "name": "Health",
        "color": "#22aa44",
        "objectives": [
            {"title": "Sleep better", "keyResults": [{"description": "8h nights", "targetValue": 1}]}
        ]
    }"##;

    env.bearing()
        .args(["theme", "save", "-"])
        .write_stdin(doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":\"H-O1\""))
        .stdout(predicate::str::contains("\"id\":\"H-KR1\""));
}

#[test]
fn test_theme_delete() {
    let env = env_with_theme();

    env.json(&["theme", "delete", "H"]);
    let list = env.json(&["theme", "list"]);
    assert_eq!(list["count"], 0);
    assert!(env.commit_messages()[0].starts_with("Delete theme H"));
}
