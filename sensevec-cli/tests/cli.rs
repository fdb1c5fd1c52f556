//! End-to-end tests for the sensevec binary.

use assert_cmd::Command;
use predicates::prelude::*;
use sensevec::{SenseComponent, SenseKey, SenseVectors, Vocab};
use std::fs;
use tempfile::TempDir;

/// Store with a few nouns and one city, written to a temp directory.
fn store_dir() -> TempDir {
    let vocab = Vocab::new();
    let mut store = SenseVectors::empty_for(&vocab, (16, 3));
    store.add(SenseKey::new("dog", "NOUN"), &[1.0, 0.0, 0.0], 42).unwrap();
    store.add(SenseKey::new("puppy", "NOUN"), &[0.9, 0.1, 0.0], 12).unwrap();
    store.add(SenseKey::new("dog", "VERB"), &[0.0, 1.0, 0.0], 3).unwrap();
    store.add(SenseKey::new("new york", "GPE"), &[0.0, 0.0, 1.0], 99).unwrap();
    store.add(SenseKey::new("boston", "GPE"), &[0.1, 0.0, 0.9], 20).unwrap();
    let component = SenseComponent::with_store(&vocab, store, false);

    let dir = TempDir::new().unwrap();
    component.to_disk(dir.path()).unwrap();
    dir
}

const DOC: &str = r#"{
  "tokens": [
    {"text": "The", "pos": "DET"},
    {"text": "dog", "pos": "NOUN"},
    {"text": "saw", "pos": "VERB"},
    {"text": "New", "pos": "PROPN"},
    {"text": "York", "pos": "PROPN"}
  ],
  "ents": [{"start": 3, "end": 5, "label": "GPE"}]
}"#;

fn sensevec() -> Command {
    Command::cargo_bin("sensevec").unwrap()
}

#[test]
fn test_info_human() {
    let dir = store_dir();
    sensevec()
        .args(["info", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("16 x 3"))
        .stdout(predicate::str::contains("Keys: 5"))
        .stdout(predicate::str::contains("GPE"));
}

#[test]
fn test_info_json() {
    let dir = store_dir();
    let output = sensevec()
        .args(["info", dir.path().to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["keys"], 5);
    assert_eq!(info["shape"], serde_json::json!([16, 3]));
}

#[test]
fn test_info_missing_store() {
    sensevec()
        .args(["info", "/nonexistent/store"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_query_from_stdin() {
    let dir = store_dir();
    sensevec()
        .args(["query", dir.path().to_str().unwrap(), "-n", "1", "-q"])
        .write_stdin(DOC)
        .assert()
        .success()
        .stdout(predicate::str::contains("dog|NOUN"))
        .stdout(predicate::str::contains("freq=42"))
        .stdout(predicate::str::contains("puppy|NOUN"))
        .stdout(predicate::str::contains("new_york|PROPN"));
}

#[test]
fn test_query_merge_json() {
    let dir = store_dir();
    let doc = dir.path().join("doc.json");
    fs::write(&doc, DOC).unwrap();
    let output = sensevec()
        .args([
            "query",
            dir.path().to_str().unwrap(),
            "--doc",
            doc.to_str().unwrap(),
            "--merge",
            "--format",
            "json",
            "-n",
            "1",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    // Four tokens after merging, plus the entity.
    assert_eq!(rows.len(), 5);
    let city = rows.iter().find(|r| r["kind"] == "entity").unwrap();
    assert_eq!(city["key"], "new_york|GPE");
    assert_eq!(city["freq"], 99);
    assert_eq!(city["similar"][0]["word"], "boston");
}

#[test]
fn test_query_rejects_zero_neighbours() {
    let dir = store_dir();
    sensevec()
        .args(["query", dir.path().to_str().unwrap(), "-n", "0"])
        .write_stdin(DOC)
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));
}

#[test]
fn test_key_command() {
    sensevec()
        .args(["key", "New York", "PROPN"])
        .assert()
        .success()
        .stdout("new_york|PROPN\n");
    sensevec()
        .args(["key", "New York", "PROPN", "--entity", "GPE", "--prefer-entities"])
        .assert()
        .success()
        .stdout("new_york|GPE\n");
    sensevec()
        .args(["key", "https://example.com", "X", "--url"])
        .assert()
        .success()
        .stdout("%%URL|X\n");
}

#[test]
fn test_key_without_sense_fails() {
    sensevec()
        .args(["key", "dog", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sense"));
}
