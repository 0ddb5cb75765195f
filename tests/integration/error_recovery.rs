//! Error Recovery & Resilience Tests
//!
//! Missing tables and malformed rows degrade the run; bad configuration and
//! bad arguments stop it before any stage writes output.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_devscore(input: &Path, output: &Path, config: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_devscore"))
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("--config-file")
        .arg(config)
        .arg("--no-color")
        .args(extra)
        .output()
        .expect("Failed to execute devscore")
}

fn setup(config: &str) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir_all(temp_dir.path().join("raw")).expect("Failed to create raw dir");
    std::fs::write(temp_dir.path().join("devscore.toml"), config).expect("Failed to write config");
    temp_dir
}

fn run_in(dir: &TempDir, extra: &[&str]) -> Output {
    run_devscore(
        &dir.path().join("raw"),
        &dir.path().join("processed"),
        &dir.path().join("devscore.toml"),
        extra,
    )
}

#[test]
fn test_missing_input_tables_are_not_fatal() {
    let dir = setup("");

    let output = run_in(&dir, &[]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("git_commits.csv"), "missing table not reported: {}", stderr);
    assert!(dir.path().join("processed").join("final_scores.csv").exists());
}

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = setup("");
    std::fs::write(
        dir.path().join("raw").join("git_developers.csv"),
        "name,email,commit_count\nFay,fay@example.com,2\n",
    )
    .expect("Failed to write developers");
    std::fs::write(
        dir.path().join("raw").join("git_commits.csv"),
        "commit_sha,author_email,author_name,authored_date,message,additions,deletions\n\
         f1,fay@example.com,Fay,2024-04-01 09:00:00 +0000,feat: ok,5,1\n\
         f2,fay@example.com,Fay,last tuesday,feat: bad date,5,1\n",
    )
    .expect("Failed to write commits");

    let output = run_in(&dir, &["merge"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed"));

    let merged = std::fs::read_to_string(dir.path().join("processed").join("all_commits_merged.csv"))
        .expect("merged commits");
    assert!(merged.contains("f1"));
    assert!(!merged.contains("f2"));
}

#[test]
fn test_bad_weights_are_fatal_before_any_stage() {
    let dir = setup("[weights]\ncommit-quality = 0.9\n");

    let output = run_in(&dir, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    assert!(!dir.path().join("processed").exists());
}

#[test]
fn test_inverted_cutoffs_are_fatal() {
    let dir = setup("[commit-quality]\nchange-size-small = 600\n");

    let output = run_in(&dir, &["--validate-config"]);
    assert!(!output.status.success());
}

#[test]
fn test_unparseable_config_value_is_fatal() {
    let dir = setup("[grading]\nsenior-threshold = \"high\"\n");

    let output = run_in(&dir, &["--validate-config"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("senior-threshold"));
}

#[test]
fn test_unknown_stage_is_rejected() {
    let dir = setup("");

    let output = run_in(&dir, &["deploy"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("deploy"));
}

#[test]
fn test_invalid_date_is_rejected() {
    let dir = setup("");

    let output = run_in(&dir, &["--since", "the day before"]);
    assert!(!output.status.success());
}

#[test]
fn test_unknown_user_is_an_error() {
    let dir = setup("");

    let output = run_in(&dir, &["--user", "nobody@example.com"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nobody@example.com"));
}
