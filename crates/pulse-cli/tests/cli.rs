use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pulse(state: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pulse").unwrap();
    cmd.arg("--state-dir").arg(state.path());
    cmd.env_remove("PULSE_LOG");
    cmd
}

fn export(state: &TempDir) -> serde_json::Value {
    let output = pulse(state).arg("export").output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn show_prints_seed_tree() {
    let state = TempDir::new().unwrap();
    pulse(&state)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Address: https://www.microsoft.com/edge\n",
        ))
        .stdout(predicate::str::contains(">   Microsoft Edge"))
        .stdout(predicate::str::contains("#tab-shadcn"));
}

#[test]
fn add_group_then_drop_tab_into_it() {
    let state = TempDir::new().unwrap();
    pulse(&state)
        .args(["add-group", "--title", "Reading"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Added group "));

    let exported = export(&state);
    let group_id = exported["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["title"] == "Reading")
        .and_then(|item| item["id"].as_str())
        .unwrap()
        .to_string();

    pulse(&state)
        .args(["move", "tab-cef", &group_id])
        .assert()
        .success();

    let exported = export(&state);
    let items = exported["items"].as_array().unwrap();
    let cef = items.iter().find(|item| item["id"] == "tab-cef").unwrap();
    assert_eq!(cef["parentId"], group_id.as_str());
    assert_eq!(cef["order"], 0);
    assert_eq!(exported["version"], 1);
}

#[test]
fn session_files_are_written() {
    let state = TempDir::new().unwrap();
    pulse(&state).args(["select", "tab-cef"]).assert().success();

    assert!(state.path().join("state/workspace-state.json").is_file());
    assert!(state.path().join("local/pulse.ui.session.v1").is_file());
    assert_eq!(export(&state)["selectedItemId"], "tab-cef");
}

#[test]
fn remove_unknown_id_fails() {
    let state = TempDir::new().unwrap();
    pulse(&state)
        .args(["remove", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn navigate_and_runtime_event() {
    let state = TempDir::new().unwrap();
    pulse(&state)
        .args(["navigate", "rust lifetimes"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "tab-edge -> https://duckduckgo.com/?q=rust%20lifetimes",
        ));

    pulse(&state)
        .args([
            "runtime-event",
            r#"{"tabId":"tab-edge","url":"https://doc.rust-lang.org/book","title":"The Book"}"#,
        ])
        .assert()
        .success();

    let exported = export(&state);
    assert_eq!(exported["address"], "https://doc.rust-lang.org/book");
    let edge = exported["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == "tab-edge")
        .unwrap()
        .clone();
    assert_eq!(edge["title"], "The Book");
}

#[test]
fn reset_restores_seed() {
    let state = TempDir::new().unwrap();
    pulse(&state).args(["remove", "group-project"]).assert().success();
    assert_eq!(export(&state)["items"].as_array().unwrap().len(), 3);

    pulse(&state).arg("reset").assert().success();
    assert_eq!(export(&state)["items"].as_array().unwrap().len(), 6);
}

#[test]
fn corrupt_primary_falls_back() {
    let state = TempDir::new().unwrap();
    pulse(&state).args(["select", "tab-shadcn"]).assert().success();
    std::fs::write(state.path().join("state/workspace-state.json"), "{ broken").unwrap();

    assert_eq!(export(&state)["selectedItemId"], "tab-shadcn");
}

#[test]
fn validate_reports_repairs_and_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    std::fs::write(
        &good,
        r#"{"version":1,"items":[{"id":"g","kind":"group","parentId":null,"order":0,"title":"G","collapsed":false},{"id":""}],"selectedItemId":"g","address":"https://a.example"}"#,
    )
    .unwrap();
    pulse(&dir)
        .args(["validate", "--input"])
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid: 1 items (version 1)"))
        .stdout(predicate::str::contains("dropped 1 invalid item(s)"));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"version":3,"items":[]}"#).unwrap();
    pulse(&dir)
        .args(["validate", "--input"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid"));
}
