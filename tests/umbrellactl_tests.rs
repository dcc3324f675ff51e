use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn ctl(store: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("umbrellactl").unwrap();
    cmd.env("UMBRELLA_STORE", store);
    cmd
}

#[test]
fn config_example_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let out = ctl(&dir.path().join("s.json"))
        .args(["config", "example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[providers.gemini]"))
        .get_output()
        .stdout
        .clone();

    let path = dir.path().join("umbrella.toml");
    fs::write(&path, out).unwrap();
    ctl(&dir.path().join("s.json"))
        .args(["config", "validate", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("OK"));
}

#[test]
fn config_set_writes_typed_values_and_rejects_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("s.json");
    let path = dir.path().join("umbrella.toml");
    fs::write(&path, "[server]\nbind = \"127.0.0.1:3000\"\n").unwrap();

    ctl(&store)
        .args(["config", "set", "--path"])
        .arg(&path)
        .args(["analysis.request_timeout_secs", "15"])
        .assert()
        .success();
    let txt = fs::read_to_string(&path).unwrap();
    assert!(txt.contains("request_timeout_secs = 15"), "{txt}");

    ctl(&store)
        .args(["config", "set", "--path"])
        .arg(&path)
        .args(["analysis.bogus", "1"])
        .assert()
        .failure();
    assert_eq!(fs::read_to_string(&path).unwrap(), txt);

    ctl(&store)
        .args(["config", "unset", "--path"])
        .arg(&path)
        .arg("analysis.request_timeout_secs")
        .assert()
        .success();
    assert!(!fs::read_to_string(&path).unwrap().contains("request_timeout_secs"));
}

#[test]
fn relay_settings_persist_in_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("s.json");

    ctl(&store).args(["relay", "provider", "deepseek"]).assert().success();
    ctl(&store)
        .args(["relay", "backend", "http://10.1.2.3:3000/"])
        .assert()
        .success();
    ctl(&store)
        .args(["relay", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider\": \"deepseek\""))
        .stdout(predicate::str::contains("\"backendUrl\": \"http://10.1.2.3:3000\""));
}

#[test]
fn scan_with_unreachable_backend_records_local_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("s.json");
    let text = dir.path().join("page.txt");
    fs::write(&text, "Congratulations, you won a prize").unwrap();

    ctl(&store)
        .args(["--backend", "http://127.0.0.1:1", "scan", "https://prize.example"])
        .arg("--text-file")
        .arg(&text)
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to analyze website content"))
        .stdout(predicate::str::contains("\"confidenceScore\": 0.0"))
        .stderr(predicate::str::contains("[WARN]"));

    let out = ctl(&store)
        .args(["history", "list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let history: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["url"], "https://prize.example");

    ctl(&store).args(["history", "clear"]).assert().success();
    ctl(&store)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn corrupt_store_is_reported_before_being_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("s.json");
    fs::write(&store, r#"{"config":{"provider":"deepseek"},"scanHistory":[{"url":"#).unwrap();
    let text = dir.path().join("page.txt");
    fs::write(&text, "hello").unwrap();

    ctl(&store)
        .env("RUST_LOG", "warn")
        .args(["--backend", "http://127.0.0.1:1", "scan", "https://a.example"])
        .arg("--text-file")
        .arg(&text)
        .assert()
        .success()
        .stderr(predicate::str::contains("local store is corrupt"))
        .stderr(predicate::str::contains("backend analysis failed"))
        .stdout(predicate::str::contains("local store is corrupt").not());
}
