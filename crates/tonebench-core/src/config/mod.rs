//! Project configuration for tonebench
//!
//! Read from `tonebench.toml`; every key is optional and a missing file
//! means all defaults.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TonebenchError};
use crate::provider::ProviderSettings;

pub use types::{
    responses_file_name, JudgeConfig, PathsConfig, SubjectConfig, TonebenchConfig, CONFIG_FILE,
    DEFAULT_JUDGE_MODEL,
};

/// Environment variable naming the judge deployment
pub const JUDGE_MODEL_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";

/// Configured paths made absolute against a project root
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub prompts: PathBuf,
    pub rubric: PathBuf,
    pub responses_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl TonebenchConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| TonebenchError::io_operation("read config", path.display(), e))?;
        let config: TonebenchConfig = toml::from_str(&content)?;
        debug!(path = %path.display(), subjects = config.subjects.len(), "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn subject_names(&self) -> Vec<String> {
        self.subjects.keys().cloned().collect()
    }

    /// Look up a configured subject
    pub fn subject(&self, name: &str) -> Result<&SubjectConfig> {
        self.subjects
            .get(name)
            .ok_or_else(|| TonebenchError::UnknownSubject {
                name: name.to_string(),
                available: self.subject_names().join(", "),
            })
    }

    pub fn resolve(&self, root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            root: root.to_path_buf(),
            prompts: root.join(&self.paths.prompts),
            rubric: root.join(&self.paths.rubric),
            responses_dir: root.join(&self.paths.responses_dir),
            results_dir: root.join(&self.paths.results_dir),
        }
    }

    /// Responses file for a subject. Unconfigured subjects use the
    /// conventional file name, which is what `gather` writes for new ones.
    pub fn responses_path(&self, root: &Path, subject: &str) -> PathBuf {
        let file = self
            .subjects
            .get(subject)
            .map(|s| s.responses.clone())
            .unwrap_or_else(|| PathBuf::from(responses_file_name(subject)));
        self.resolve(root).responses_dir.join(file)
    }

    /// Judge model: environment, then config, then the built-in default
    pub fn judge_model_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(JUDGE_MODEL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.judge.model.clone())
            .unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string())
    }

    pub fn judge_model(&self) -> String {
        self.judge_model_with(|key| std::env::var(key).ok())
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            timeout_secs: self.judge.timeout_secs,
            api_version: self.judge.api_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = TonebenchConfig::default();
        assert_eq!(
            config.subject_names(),
            vec!["ActualClaude", "ClaudeBot", "ClaudeBot-v2", "GPTBot"]
        );
        assert_eq!(config.paths.prompt_column, "userQuery");
        assert_eq!(config.judge.provider, ProviderKind::AzureOpenai);
        assert_eq!(config.judge.max_tokens, 4000);
        assert_eq!(config.judge.temperature, 0.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[paths]
results_dir = "out"

[judge]
provider = "anthropic"
model = "claude-sonnet-4-5"

[subjects.KimiBot]
responses = "bot_responses/Output - KimiBot Responses.jsonl"
"#,
        )
        .unwrap();

        let config = TonebenchConfig::load_or_default(&path).unwrap();
        assert_eq!(config.paths.results_dir, PathBuf::from("out"));
        assert_eq!(config.paths.prompts, PathBuf::from("input-prompts.csv"));
        assert_eq!(config.judge.provider, ProviderKind::Anthropic);
        assert_eq!(config.judge.timeout_secs, 120);
        assert_eq!(config.subject_names(), vec!["KimiBot"]);

        let resolved = config.resolve(dir.path());
        assert_eq!(resolved.results_dir, dir.path().join("out"));
        assert_eq!(
            config.responses_path(dir.path(), "KimiBot"),
            dir.path().join("./bot_responses/Output - KimiBot Responses.jsonl")
        );
    }

    #[test]
    fn test_missing_file_is_default_and_bad_file_errors() {
        let dir = tempdir().unwrap();
        let missing = TonebenchConfig::load_or_default(&dir.path().join("none.toml")).unwrap();
        assert_eq!(missing, TonebenchConfig::default());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[judge]\nprovider = \"bedrock\"\n").unwrap();
        assert!(matches!(
            TonebenchConfig::load(&bad),
            Err(TonebenchError::Toml(_))
        ));
    }

    #[test]
    fn test_unknown_subject() {
        let config = TonebenchConfig::default();
        match config.subject("Nope") {
            Err(TonebenchError::UnknownSubject { name, available }) => {
                assert_eq!(name, "Nope");
                assert!(available.contains("GPTBot"));
            }
            other => panic!("expected unknown subject, got {:?}", other),
        }
    }

    #[test]
    fn test_judge_model_precedence() {
        let mut config = TonebenchConfig::default();
        assert_eq!(config.judge_model_with(|_| None), DEFAULT_JUDGE_MODEL);

        config.judge.model = Some("from-config".into());
        assert_eq!(config.judge_model_with(|_| None), "from-config");
        assert_eq!(
            config.judge_model_with(|_| Some("from-env".into())),
            "from-env"
        );
    }
}
