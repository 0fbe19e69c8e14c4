//! Shared fixtures for CLI integration tests

#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use assert_cmd::{cargo::cargo_bin_cmd, Command};

/// Credential and logging variables that would leak in from the host
const HOST_VARS: [&str; 16] = [
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_DEPLOYMENT",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "ANTHROPIC_API_KEY",
    "TONEBENCH_CONFIG",
    "TONEBENCH_LOG",
    "RUST_LOG",
    "NO_COLOR",
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// A tonebench command with a clean environment, rooted at `root`
pub fn tonebench(root: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("tonebench");
    for var in HOST_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(root);
    cmd
}

pub fn write_prompts(root: &Path, prompts: &[&str]) {
    let mut body = String::from("id,userQuery\n");
    for (i, prompt) in prompts.iter().enumerate() {
        body.push_str(&format!("{},\"{}\"\n", i + 1, prompt.replace('"', "\"\"")));
    }
    fs::write(root.join("input-prompts.csv"), body).unwrap();
}

pub fn write_responses(path: &Path, pairs: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let body: String = pairs
        .iter()
        .map(|(query, response)| {
            format!(
                "{}\n",
                serde_json::json!({ "query": query, "response": response })
            )
        })
        .collect();
    fs::write(path, body).unwrap();
}

pub fn write_rubric(root: &Path) {
    fs::write(
        root.join("Teen Support Bot Tone Evaluator - No Ground Truth.md"),
        "# Tone rubric\n\nScore each dimension from 0 to 10.\n",
    )
    .unwrap();
}

pub fn evaluation(overall: f64) -> serde_json::Value {
    serde_json::json!({
        "overall_score": overall,
        "dimension_scores": {
            "warmth_validation": overall,
            "prose_vs_bullets": 9.0,
            "emoji_usage": 5.0,
            "conversational_tone": overall,
            "practical_advice": 6.0,
            "followup_question": 4.0,
            "support_solutions_balance": 7.0,
            "length_conciseness": 8.0
        },
        "strengths": ["warm"],
        "weaknesses": ["long"],
        "most_ideal_aspect": "Validates feelings first",
        "least_ideal_aspect": "Too many questions",
        "bullet_point_analysis": {
            "bullet_count": 0,
            "prose_percentage": "100%",
            "notes": "all prose"
        },
        "specific_feedback": []
    })
}

/// Write a stored result under `<root>/evaluation_results_no_gt/individual`
pub fn write_result(root: &Path, subject: &str, index: u32, evaluation: serde_json::Value) {
    let dir = root.join("evaluation_results_no_gt").join("individual");
    fs::create_dir_all(&dir).unwrap();
    let result = serde_json::json!({
        "subject_name": subject,
        "query_index": index,
        "user_query": format!("query {}", index),
        "evaluation": evaluation,
    });
    fs::write(
        dir.join(format!("{}_query_{:03}.json", subject, index)),
        serde_json::to_string_pretty(&result).unwrap(),
    )
    .unwrap();
}

/// Minimal chat-completions server that always returns `content`.
///
/// Returns the base URL and a counter of requests served.
pub fn spawn_judge_server(content: String) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let body = serde_json::json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
    .to_string();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                if line == "\r\n" {
                    break;
                }
            }
            let mut request_body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut request_body);

            counter.fetch_add(1, Ordering::SeqCst);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (url, hits)
}
