//! End-to-End Integration Tests
//!
//! Runs the devscore binary over seeded raw tables and checks the processed
//! tables, dimension score files and final results it leaves behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let input = root.path().join("raw");
        let output = root.path().join("processed");
        std::fs::create_dir_all(&input).expect("Failed to create raw dir");
        let config = root.path().join("devscore.toml");
        std::fs::write(&config, "").expect("Failed to write config");
        Self { _root: root, input, output, config }
    }

    fn write_raw(&self, name: &str, content: &str) {
        std::fs::write(self.input.join(name), content).expect("Failed to write raw table");
    }

    fn write_config(&self, content: &str) {
        std::fs::write(&self.config, content).expect("Failed to write config");
    }

    fn run(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_devscore"))
            .arg("-i")
            .arg(&self.input)
            .arg("-o")
            .arg(&self.output)
            .arg("--config-file")
            .arg(&self.config)
            .arg("--no-color")
            .args(extra)
            .output()
            .expect("Failed to execute devscore")
    }
}

/// Rows of a CSV file keyed by header name
fn read_rows(path: &Path) -> Vec<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).expect("Failed to read CSV");
    let mut reader = csv::Reader::from_reader(content.trim_start_matches('\u{feff}').as_bytes());
    reader
        .deserialize::<HashMap<String, String>>()
        .map(|row| row.expect("Malformed CSV row"))
        .collect()
}

fn row_for<'a>(rows: &'a [HashMap<String, String>], email: &str) -> &'a HashMap<String, String> {
    rows.iter()
        .find(|row| row["email"] == email)
        .unwrap_or_else(|| panic!("No row for {}", email))
}

/// One developer with 10 commits: 6 conventional titles, 7 small changes
/// and a single fix
fn seed_reference_developer(ws: &Workspace) {
    ws.write_raw("git_developers.csv", "name,email,commit_count\nDana,dana@example.com,10\n");

    let mut commits = String::from("commit_sha,author_email,author_name,authored_date,message,additions,deletions\n");
    for i in 0..10 {
        let title = match i {
            0 => "fix: null check".to_string(),
            1..=5 => format!("feat: feature {}", i),
            _ => format!("Update module {}", i),
        };
        let (additions, deletions) = if i < 7 { (30, 10) } else { (250, 50) };
        commits.push_str(&format!(
            "c{},dana@example.com,Dana,2024-01-{:02} 10:00:00 +0000,{},{},{}\n",
            i,
            i + 1,
            title,
            additions,
            deletions
        ));
    }
    ws.write_raw("git_commits.csv", &commits);
}

#[test]
fn test_full_run_reference_developer() {
    let ws = Workspace::new();
    seed_reference_developer(&ws);

    let output = ws.run(&[]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let quality = read_rows(&ws.output.join("commit_quality_scores.csv"));
    let dana = row_for(&quality, "dana@example.com");
    assert_eq!(dana["sample_size"], "10");
    assert_eq!(dana["conventional_rate"], "0.6");
    assert_eq!(dana["small_rate"], "0.7");
    assert_eq!(dana["fix_rate"], "0.1");

    for name in [
        "unified_developers.csv",
        "all_commits_merged.csv",
        "file_changes_cleaned.csv",
        "all_reviews_merged.csv",
        "final_scores.csv",
    ] {
        assert!(ws.output.join(name).exists(), "{} was not written", name);
    }

    let finals = read_rows(&ws.output.join("final_scores.csv"));
    let dana = row_for(&finals, "dana@example.com");
    let final_score: f64 = dana["final_score"].parse().expect("final_score is numeric");
    assert!((0.0..=10.0).contains(&final_score));
    // No reviews were collected, so that dimension is unavailable
    assert_eq!(dana["code_review_score"], "");
    assert!(["senior", "mid", "junior"].contains(&dana["grade_level"].as_str()));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Developer scores:"));
    assert!(stdout.contains("dana@example.com"));
}

#[test]
fn test_json_output_for_one_developer() {
    let ws = Workspace::new();
    seed_reference_developer(&ws);

    let output = ws.run(&["--format", "json", "--user", "Dana"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["email"], "dana@example.com");
    assert!(value["scores"]["code_review"].is_null());
    assert!(value["scores"]["commit_quality"].is_number());
}

#[test]
fn test_single_stage_reruns_from_cached_tables() {
    let ws = Workspace::new();
    seed_reference_developer(&ws);

    let output = ws.run(&["merge"]);
    assert!(output.status.success());
    assert!(ws.output.join("all_commits_merged.csv").exists());
    assert!(!ws.output.join("commit_quality_scores.csv").exists());

    // Raw tables are no longer needed once merged
    std::fs::remove_file(ws.input.join("git_commits.csv")).expect("Failed to remove raw table");

    let output = ws.run(&["commit-quality", "score"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(ws.output.join("commit_quality_scores.csv").exists());
    assert!(!ws.output.join("progress_scores.csv").exists());

    let finals = read_rows(&ws.output.join("final_scores.csv"));
    let dana = row_for(&finals, "dana@example.com");
    assert_ne!(dana["commit_quality_score"], "");
    assert_eq!(dana["contribution_score"], "");
}

#[test]
fn test_aliases_and_date_window() {
    let ws = Workspace::new();
    ws.write_raw(
        "git_developers.csv",
        "name,email,commit_count\nEve,eve@example.com,2\nEve,eve@old-laptop.local,1\n",
    );
    ws.write_raw(
        "git_commits.csv",
        "commit_sha,author_email,author_name,authored_date,message,additions,deletions\n\
         e1,eve@example.com,Eve,2024-02-01 09:00:00 +0000,feat: export,10,2\n\
         e2,eve@old-laptop.local,Eve,2024-02-03 09:00:00 +0000,fix: export path,3,1\n\
         e3,eve@example.com,Eve,2023-06-01 09:00:00 +0000,chore: old work,3,1\n",
    );
    ws.write_config("[aliases]\n\"eve@old-laptop.local\" = \"eve@example.com\"\n");

    let output = ws.run(&["merge", "--since", "2024-01-01"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let developers = read_rows(&ws.output.join("unified_developers.csv"));
    assert_eq!(developers.len(), 1);
    assert_eq!(developers[0]["email"], "eve@example.com");
    assert_eq!(developers[0]["commit_count"], "3");

    let commits = read_rows(&ws.output.join("all_commits_merged.csv"));
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|c| c["author_email"] == "eve@example.com"));
}

#[test]
fn test_list_stages_and_validate_config() {
    let ws = Workspace::new();

    let output = ws.run(&["--list-stages"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for stage in ["merge", "analyze", "commit-quality", "work-pattern", "score", "all"] {
        assert!(stdout.contains(stage), "missing stage {}", stage);
    }

    let output = ws.run(&["--validate-config"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));
    assert!(!ws.output.exists());
}

#[test]
fn test_export_config_round_trip() {
    let ws = Workspace::new();
    ws.write_config("[grading]\nsenior-threshold = 8.5\n");
    let exported = ws.input.join("exported.toml");

    let output = ws.run(&["--export-config", exported.to_str().expect("utf-8 path")]);
    assert!(output.status.success());
    let content = std::fs::read_to_string(&exported).expect("exported config");
    assert!(content.contains("senior-threshold = 8.5"));

    let reloaded = Command::new(env!("CARGO_BIN_EXE_devscore"))
        .arg("--config-file")
        .arg(&exported)
        .arg("--validate-config")
        .output()
        .expect("Failed to execute devscore");
    assert!(reloaded.status.success(), "stderr: {}", String::from_utf8_lossy(&reloaded.stderr));
}
