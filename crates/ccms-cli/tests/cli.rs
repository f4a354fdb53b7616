use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_jsonl(dir: &std::path::Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    path
}

#[test]
fn finds_a_match_and_exits_zero() {
    let dir = tempdir().unwrap();
    write_jsonl(
        dir.path(),
        "session.jsonl",
        &[r#"{"type":"user","uuid":"u1","message":{"role":"user","content":"connection failed"}}"#],
    );

    Command::cargo_bin("ccms")
        .unwrap()
        .args([
            "connection AND failed",
            "-p",
            &format!("{}/*.jsonl", dir.path().display()),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("u1"));
}

#[test]
fn empty_corpus_exits_zero_with_no_output() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("ccms")
        .unwrap()
        .args([
            "anything",
            "-p",
            &format!("{}/*.jsonl", dir.path().display()),
        ])
        .assert()
        .success();
}

#[test]
fn malformed_glob_exits_one() {
    Command::cargo_bin("ccms")
        .unwrap()
        .args(["anything", "-p", "[unterminated"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn bad_role_flag_exits_two() {
    Command::cargo_bin("ccms")
        .unwrap()
        .args(["anything", "--role", "not-a-role"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn json_format_emits_a_valid_array() {
    let dir = tempdir().unwrap();
    write_jsonl(
        dir.path(),
        "session.jsonl",
        &[r#"{"type":"user","uuid":"u1","message":{"role":"user","content":"hello world"}}"#],
    );

    let output = Command::cargo_bin("ccms")
        .unwrap()
        .args([
            "hello",
            "-p",
            &format!("{}/*.jsonl", dir.path().display()),
            "-f",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.is_array());
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn cap_flag_shows_the_showing_summary_line() {
    let dir = tempdir().unwrap();
    let lines: Vec<String> = (0..20)
        .map(|i| format!(r#"{{"type":"user","uuid":"u{i}","message":{{"role":"user","content":"test {i}"}}}}"#))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_jsonl(dir.path(), "session.jsonl", &refs);

    Command::cargo_bin("ccms")
        .unwrap()
        .args([
            "test",
            "-p",
            &format!("{}/*.jsonl", dir.path().display()),
            "-n",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 5 of 20 total results"));
}
