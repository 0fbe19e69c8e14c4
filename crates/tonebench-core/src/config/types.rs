//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::judge::{DEFAULT_JUDGE_MAX_TOKENS, DEFAULT_JUDGE_TEMPERATURE};
use crate::provider::{ProviderKind, DEFAULT_AZURE_API_VERSION, DEFAULT_TIMEOUT_SECS};

/// Default configuration file name
pub const CONFIG_FILE: &str = "tonebench.toml";
/// Judge deployment used when neither config nor environment names one
pub const DEFAULT_JUDGE_MODEL: &str = "kimi-2-5";

const DEFAULT_SUBJECTS: [&str; 4] = ["ActualClaude", "ClaudeBot", "ClaudeBot-v2", "GPTBot"];

/// Top-level `tonebench.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonebenchConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub judge: JudgeConfig,

    /// Subjects under evaluation, keyed by name
    #[serde(default = "default_subjects")]
    pub subjects: BTreeMap<String, SubjectConfig>,
}

impl Default for TonebenchConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            judge: JudgeConfig::default(),
            subjects: default_subjects(),
        }
    }
}

/// Input and output locations; relative paths resolve against the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_prompts")]
    pub prompts: PathBuf,

    /// CSV column holding one query per row
    #[serde(default = "default_prompt_column")]
    pub prompt_column: String,

    #[serde(default = "default_rubric")]
    pub rubric: PathBuf,

    #[serde(default = "default_responses_dir")]
    pub responses_dir: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            prompts: default_prompts(),
            prompt_column: default_prompt_column(),
            rubric: default_rubric(),
            responses_dir: default_responses_dir(),
            results_dir: default_results_dir(),
        }
    }
}

/// Judge model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model or Azure deployment name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_version: default_api_version(),
        }
    }
}

/// One subject's gathered-responses file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    /// Relative to `paths.responses_dir`
    pub responses: PathBuf,
}

/// Conventional responses file name for a subject
pub fn responses_file_name(subject: &str) -> String {
    format!("Output - {} Responses.jsonl", subject)
}

fn default_subjects() -> BTreeMap<String, SubjectConfig> {
    DEFAULT_SUBJECTS
        .iter()
        .map(|name| {
            (
                name.to_string(),
                SubjectConfig {
                    responses: PathBuf::from(responses_file_name(name)),
                },
            )
        })
        .collect()
}

fn default_prompts() -> PathBuf {
    PathBuf::from("input-prompts.csv")
}

fn default_prompt_column() -> String {
    "userQuery".to_string()
}

fn default_rubric() -> PathBuf {
    PathBuf::from("Teen Support Bot Tone Evaluator - No Ground Truth.md")
}

fn default_responses_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("evaluation_results_no_gt")
}

fn default_temperature() -> f64 {
    DEFAULT_JUDGE_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_JUDGE_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_api_version() -> String {
    DEFAULT_AZURE_API_VERSION.to_string()
}
