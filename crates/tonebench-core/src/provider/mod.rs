//! Model provider capability
//!
//! Judging and response gathering both reduce to one call: send an optional
//! system context and one user message, get text back. [`Provider`] is that
//! capability; each backend implements it and the rest of the crate never
//! branches on which backend is in use.

mod anthropic;
mod http;
mod openai;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TonebenchError};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Default Azure OpenAI API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";
/// Default request timeout for provider calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: Option<&'a str>,
    pub user: &'a str,
    /// Model name (or deployment name for Azure)
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the backend to constrain output to a JSON object, where supported
    pub json_object: bool,
}

/// A text-completion backend.
pub trait Provider {
    /// Short backend identifier used in logs and errors
    fn name(&self) -> &str;

    /// Perform one blocking completion call.
    ///
    /// A successful call with no message text returns an empty string;
    /// callers decide whether that is an error.
    fn invoke(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, request: &CompletionRequest<'_>) -> Result<String> {
        (**self).invoke(request)
    }
}

/// Connection settings shared by all backends
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub api_version: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }
}

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    AzureOpenai,
    Openai,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::AzureOpenai,
        ProviderKind::Openai,
        ProviderKind::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::AzureOpenai => "azure-openai",
            ProviderKind::Openai => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Build a provider from process environment credentials.
    pub fn build_from_env(&self, settings: &ProviderSettings) -> Result<Box<dyn Provider>> {
        self.build_with(settings, |key| std::env::var(key).ok())
    }

    /// Build a provider using `lookup` to resolve credential variables.
    ///
    /// Fails with [`TonebenchError::MissingCredentials`] naming every
    /// required variable when any of them is unset or empty.
    pub fn build_with<F>(&self, settings: &ProviderSettings, lookup: F) -> Result<Box<dyn Provider>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match self {
            ProviderKind::AzureOpenai => {
                match (get("AZURE_OPENAI_ENDPOINT"), get("AZURE_OPENAI_API_KEY")) {
                    (Some(endpoint), Some(api_key)) => Ok(Box::new(OpenAiProvider::azure(
                        endpoint, api_key, settings,
                    ))),
                    _ => Err(self.missing("AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY")),
                }
            }
            ProviderKind::Openai => match get("OPENAI_API_KEY") {
                Some(api_key) => Ok(Box::new(OpenAiProvider::openai(
                    get("OPENAI_BASE_URL"),
                    api_key,
                    settings,
                ))),
                None => Err(self.missing("OPENAI_API_KEY")),
            },
            ProviderKind::Anthropic => match get("ANTHROPIC_API_KEY") {
                Some(api_key) => Ok(Box::new(AnthropicProvider::new(api_key, settings))),
                None => Err(self.missing("ANTHROPIC_API_KEY")),
            },
        }
    }

    fn missing(&self, variables: &str) -> TonebenchError {
        TonebenchError::MissingCredentials {
            provider: self.as_str().to_string(),
            variables: variables.to_string(),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = TonebenchError;

    fn from_str(s: &str) -> Result<Self> {
        ProviderKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                TonebenchError::UsageError(format!(
                    "unknown provider '{}' (expected: azure-openai, openai, or anthropic)",
                    s
                ))
            })
    }
}
