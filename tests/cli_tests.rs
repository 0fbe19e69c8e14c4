//! Integration tests for the tonebench CLI
//!
//! These tests run the tonebench binary against temporary project
//! directories and check output and exit codes.

mod support;

use std::fs;
use std::sync::atomic::Ordering;

use predicates::prelude::*;
use tempfile::tempdir;

use support::{
    evaluation, spawn_judge_server, tonebench, write_prompts, write_responses, write_result,
    write_rubric,
};

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help_flag() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: tonebench"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("failures"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("diversity"));
}

#[test]
fn test_version_flag() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tonebench"));
}

#[test]
fn test_no_command_prints_banner() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("tonebench --help"));
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_unknown_format_exit_code_2() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .args(["--format", "records", "subjects"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_subject_exit_code_2() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .args(["evaluate", "NoSuchBot"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown subject 'NoSuchBot'"))
        .stderr(predicate::str::contains("GPTBot"));
}

#[test]
fn test_unknown_subject_json_envelope() {
    let dir = tempdir().unwrap();
    let output = tonebench(dir.path())
        .args(["--format", "json", "evaluate", "NoSuchBot"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(json["error"]["code"], 2);
    assert_eq!(json["error"]["type"], "unknown_subject");
}

#[test]
fn test_missing_credentials_exit_before_processing() {
    let dir = tempdir().unwrap();
    write_prompts(dir.path(), &["hi"]);

    tonebench(dir.path())
        .args(["evaluate", "GPTBot"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("AZURE_OPENAI_ENDPOINT"));

    assert!(!dir.path().join("evaluation_results_no_gt").exists());
}

#[test]
fn test_missing_prompts_exit_code_3() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .env("AZURE_OPENAI_ENDPOINT", "http://127.0.0.1:9")
        .env("AZURE_OPENAI_API_KEY", "test-key")
        .args(["evaluate", "GPTBot"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("prompts file not found"));
}

#[test]
fn test_gather_missing_credentials() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .args(["gather", "NewBot", "--provider", "anthropic", "--model", "claude"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

// ============================================================================
// evaluate
// ============================================================================

#[test]
fn test_evaluate_judges_then_resumes() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_prompts(root, &["My friend ghosted me", "I failed my test"]);
    write_responses(
        &root.join("Output - GPTBot Responses.jsonl"),
        &[
            ("My friend ghosted me", "Oof, that stings."),
            ("I failed my test", "That's so rough."),
        ],
    );
    write_rubric(root);
    fs::write(root.join("tonebench.toml"), "[judge]\nprovider = \"openai\"\nmodel = \"judge\"\n")
        .unwrap();

    let judged = format!("Here you go:\n```json\n{}\n```", evaluation(7.5));
    let (url, hits) = spawn_judge_server(judged);

    tonebench(root)
        .env("OPENAI_API_KEY", "test-key")
        .env("OPENAI_BASE_URL", &url)
        .args(["evaluate", "GPTBot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 evaluated, 0 skipped, 0 need retry"));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    let saved = root
        .join("evaluation_results_no_gt")
        .join("individual")
        .join("GPTBot_query_002.json");
    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(saved).unwrap()).unwrap();
    assert_eq!(result["subject_name"], "GPTBot");
    assert_eq!(result["query_index"], 2);
    assert_eq!(result["user_query"], "I failed my test");
    assert_eq!(result["evaluation"]["overall_score"], 7.5);

    tonebench(root)
        .env("OPENAI_API_KEY", "test-key")
        .env("OPENAI_BASE_URL", &url)
        .args(["evaluate", "GPTBot", "--retry-failed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 2 items"))
        .stdout(predicate::str::contains("0 evaluated, 2 skipped"));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_evaluate_retries_only_failed_items() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_prompts(root, &["one", "two", "three"]);
    write_responses(
        &root.join("Output - GPTBot Responses.jsonl"),
        &[("one", "a"), ("two", "b"), ("three", "c")],
    );
    write_rubric(root);
    fs::write(root.join("tonebench.toml"), "[judge]\nprovider = \"openai\"\n").unwrap();
    write_result(root, "GPTBot", 1, evaluation(8.0));
    write_result(
        root,
        "GPTBot",
        2,
        serde_json::json!({ "overall_score": 0, "error": "Empty response from API", "judging_failed": true }),
    );

    let (url, hits) = spawn_judge_server(evaluation(6.0).to_string());

    let output = tonebench(root)
        .env("OPENAI_API_KEY", "test-key")
        .env("OPENAI_BASE_URL", &url)
        .args(["--format", "json", "evaluate", "GPTBot", "--retry-failed"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "retry_failed");
    assert_eq!(json["summary"]["evaluated"], 2);
    assert_eq!(json["summary"]["skipped"], 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    tonebench(root)
        .args(["failures", "--subject", "GPTBot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No failed evaluations found!"));
}

// ============================================================================
// failures
// ============================================================================

#[test]
fn test_failures_groups_by_reason() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_prompts(root, &["one", "two", "three"]);
    write_result(root, "GPTBot", 1, evaluation(8.0));
    write_result(
        root,
        "GPTBot",
        2,
        serde_json::json!({ "error": "GPTBot request failed: HTTP 429", "judging_failed": true }),
    );

    tonebench(root)
        .args(["failures", "--subject", "GPTBot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total evaluations: 3"))
        .stdout(predicate::str::contains("Failed evaluations: 2"))
        .stdout(predicate::str::contains("Not yet evaluated"))
        .stdout(predicate::str::contains("Queries: 002"))
        .stdout(predicate::str::contains(
            "tonebench evaluate GPTBot --retry-failed",
        ));
}

#[test]
fn test_failures_json_covers_all_subjects() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_prompts(root, &["one", "two"]);
    write_result(root, "GPTBot", 1, evaluation(8.0));
    write_result(root, "GPTBot", 2, evaluation(0.0));

    let output = tonebench(root)
        .args(["--format", "json", "failures"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // four default subjects, two prompts each; a zero score is not a failure
    assert_eq!(json["total"], 8);
    assert_eq!(json["failed"], 6);
    assert_eq!(json["retry_commands"].as_array().unwrap().len(), 3);
    assert_eq!(json["counts_by_kind"]["ClaudeBot"]["missing"], 2);
    assert!(json["counts_by_kind"].get("GPTBot").is_none());
}

#[test]
fn test_failures_include_subjects_found_only_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_prompts(root, &["one", "two"]);
    write_result(root, "KimiBot", 1, evaluation(8.0));

    let output = tonebench(root)
        .args(["--format", "json", "failures"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // four configured subjects plus KimiBot, two prompts each
    assert_eq!(json["total"], 10);
    assert_eq!(json["counts_by_kind"]["KimiBot"]["missing"], 1);

    tonebench(root)
        .arg("failures")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "tonebench evaluate KimiBot --retry-failed",
        ));
}

// ============================================================================
// merge
// ============================================================================

#[test]
fn test_merge_writes_csv_and_report() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_result(root, "GPTBot", 1, evaluation(6.0));
    write_result(root, "GPTBot", 2, evaluation(8.0));
    write_result(root, "ClaudeBot", 1, evaluation(9.0));
    let results = root.join("evaluation_results_no_gt");
    fs::write(results.join("individual").join("notes.txt"), "ignored").unwrap();

    tonebench(root)
        .arg("merge")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 3 results from 2 subject(s)"))
        .stdout(predicate::str::contains("OVERALL SCORES COMPARISON"))
        .stdout(predicate::str::contains("KEY INSIGHTS"));

    let csv = fs::read_to_string(results.join("scores_summary.csv")).unwrap();
    let mut lines = csv.lines();
    assert!(lines
        .next()
        .unwrap()
        .starts_with("subject_name,query_index,user_query,overall_score"));
    assert!(lines.next().unwrap().starts_with("ClaudeBot,1,query 1,9"));
    assert_eq!(csv.lines().count(), 4);

    let report = fs::read_to_string(results.join("summary_report.txt")).unwrap();
    assert!(report.contains("SUBJECT: GPTBot (2 responses)"));
}

#[test]
fn test_merge_json_ranking() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_result(root, "GPTBot", 1, evaluation(6.0));
    write_result(root, "ClaudeBot", 1, evaluation(9.0));

    let output = tonebench(root)
        .args(["--format", "json", "merge"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"], 2);
    assert_eq!(json["ranking"][0]["subject"], "ClaudeBot");
    assert_eq!(json["ranking"][1]["subject"], "GPTBot");
}

#[test]
fn test_merge_without_results_exit_code_3() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .arg("merge")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no results found"));
}

#[test]
fn test_config_relative_paths_follow_config_dir() {
    let dir = tempdir().unwrap();
    let project = dir.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("bench.toml"), "[paths]\nresults_dir = \"out\"\n").unwrap();

    let individual = project.join("out").join("individual");
    fs::create_dir_all(&individual).unwrap();
    let result = serde_json::json!({
        "bot_name": "GPTBot",
        "query_index": 1,
        "user_query": "hi",
        "evaluation": evaluation(7.0),
    });
    fs::write(individual.join("GPTBot_query_001.json"), result.to_string()).unwrap();

    tonebench(dir.path())
        .args(["--config", "project/bench.toml", "merge"])
        .assert()
        .success();

    assert!(project.join("out").join("scores_summary.csv").is_file());
}

// ============================================================================
// diversity
// ============================================================================

#[test]
fn test_diversity_report() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let file = root.join("responses.jsonl");
    write_responses(
        &file,
        &[
            ("a", "Ugh, that's rough. Want to talk?"),
            ("b", "Ugh, that sounds hard. I'm here."),
            ("c", "Oh no, I'm sorry. What happened?"),
            ("d", "Honestly, you did your best. Be kind to yourself."),
        ],
    );

    tonebench(root)
        .args(["diversity", "GPTBot", "--responses", "responses.jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REPETITIVENESS ANALYSIS: GPTBot"))
        .stdout(predicate::str::contains("Total responses: 4"));

    let output = tonebench(root)
        .args(["--format", "json", "diversity", "GPTBot", "--responses", "responses.jsonl"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["subject"], "GPTBot");
    assert_eq!(json["patterns"]["starts_with_exclamation"].as_array().unwrap().len(), 3);
    let score = json["score"].as_f64().unwrap();
    assert!((0.0..=10.0).contains(&score));
}

#[test]
fn test_diversity_empty_and_missing_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("Output - GPTBot Responses.jsonl"), "\n").unwrap();

    tonebench(root)
        .args(["diversity", "GPTBot"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no responses to analyze for GPTBot"));

    tonebench(root)
        .args(["diversity", "ClaudeBot"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("responses file not found"));
}

// ============================================================================
// subjects
// ============================================================================

#[test]
fn test_subjects_lists_defaults() {
    let dir = tempdir().unwrap();
    tonebench(dir.path())
        .args(["--quiet", "subjects"])
        .assert()
        .success()
        .stdout("ActualClaude\nClaudeBot\nClaudeBot-v2\nGPTBot\n");
}

#[test]
fn test_subjects_from_config() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(
        root.join("tonebench.toml"),
        "[subjects.KimiBot]\nresponses = \"kimi.jsonl\"\n",
    )
    .unwrap();
    fs::write(root.join("kimi.jsonl"), "").unwrap();

    let output = tonebench(root)
        .args(["--format", "json", "subjects"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let subjects = json.as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["subject"], "KimiBot");
    assert_eq!(subjects[0]["responses_exists"], true);
}
