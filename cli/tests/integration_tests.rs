use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Writes a contacts table config into `dir` and returns its path.
fn write_config(dir: &Path) -> PathBuf {
    let yaml = r#"path: contacts.db
table: contacts
columns:
  - name: name
    type: text
  - name: age
    type: integer
  - name: score
    type: real
  - name: avatar
    type: blob
busy_timeout_ms: 500
"#;
    let path = dir.join("contacts.yml");
    fs::write(&path, yaml).expect("failed to write config");
    path
}

fn tablectl(config: &Path, args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_tablectl"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run tablectl")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "tablectl failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn insert(config: &Path, json: &str) -> serde_json::Value {
    stdout_json(&tablectl(config, &["insert", "--json", json]))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_then_matches() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let first = stdout_json(&tablectl(&config, &["init"]));
    assert_eq!(first["outcome"], "created");
    assert_eq!(first["table"], "contacts");
    assert_eq!(first["row_count"], 0);
    assert!(dir.path().join("contacts.db").exists());

    let second = stdout_json(&tablectl(&config, &["init"]));
    assert_eq!(second["outcome"], "matched");
}

#[test]
fn insert_get_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let first = insert(
        &config,
        r#"{"name": "Jonathan", "age": 41, "score": 9, "avatar": [1, 2, 3]}"#,
    );
    assert_eq!(first["index"], 0);
    let second = insert(
        &config,
        r#"{"name": "Alice", "age": 30, "score": 7.5, "avatar": []}"#,
    );
    assert_eq!(second["index"], 1);

    let row = stdout_json(&tablectl(&config, &["get", "0"]));
    assert_eq!(row["name"], "Jonathan");
    assert_eq!(row["age"], 41);
    assert_eq!(row["score"], 9.0);
    assert_eq!(row["avatar"], serde_json::json!([1, 2, 3]));

    assert_eq!(stdout_json(&tablectl(&config, &["count"])), 2);

    let rows = stdout_json(&tablectl(&config, &["dump"]));
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[1]["name"], "Alice");
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn find_and_column_reads() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    for (name, age) in [("Jonathan", 41), ("Alice", 30), ("JON", 22)] {
        insert(
            &config,
            &format!(r#"{{"name": "{name}", "age": {age}, "score": 1.0, "avatar": []}}"#),
        );
    }

    let hits = stdout_json(&tablectl(&config, &["find", "--type", "text", "%jon%"]));
    assert_eq!(hits, serde_json::json!([0, 2]));

    let hits = stdout_json(&tablectl(&config, &["find", "--type", "integer", "30"]));
    assert_eq!(hits, serde_json::json!([1]));

    let names = stdout_json(&tablectl(&config, &["column", "name"]));
    assert_eq!(names, serde_json::json!(["Jonathan", "Alice", "JON"]));

    let span = stdout_json(&tablectl(
        &config,
        &["column", "age", "--first", "2", "--count", "5"],
    ));
    assert_eq!(span, serde_json::json!([30, 22]));
}

#[test]
fn status_reports_stored_columns() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    insert(
        &config,
        r#"{"name": "Alice", "age": 30, "score": 1.0, "avatar": []}"#,
    );

    let status = stdout_json(&tablectl(&config, &["status"]));
    assert_eq!(status["table_exists"], true);
    assert_eq!(status["row_count"], 1);
    assert_eq!(status["columns"].as_array().unwrap().len(), 4);
    assert_eq!(status["columns"][1]["name"], "age");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn bad_input_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let cases: &[&[&str]] = &[
        &["insert", "--json", r#"{"name": "Alice"}"#],
        &["insert", "--json", r#"{"name": 5, "age": 1, "score": 1.0, "avatar": []}"#],
        &["insert", "--json", "not json"],
        &["get", "0"],
        &["column", "nickname"],
        &["column", "name", "--first", "0", "--count", "1"],
        &["find", "--type", "real"],
    ];
    for args in cases {
        let output = tablectl(&config, args);
        assert!(!output.status.success(), "{args:?} should fail");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("error:"), "{args:?}: {stderr}");
    }

    assert_eq!(stdout_json(&tablectl(&config, &["count"])), 0);
}

#[test]
fn undeclared_key_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = tablectl(
        &config,
        &[
            "insert",
            "--json",
            r#"{"name": "Alice", "age": 30, "score": 1.0, "avatar": [], "meta": {"a": 1}}"#,
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown column: meta"), "{stderr}");
}

#[test]
fn missing_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let output = tablectl(&dir.path().join("nope.yml"), &["count"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}
