//! Error types and exit codes for tonebench
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args, unknown subject, missing credentials)
//! - 3: Data error (missing or invalid input files, no results)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tonebench CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data error - missing input file, unreadable results (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during tonebench operations
#[derive(Error, Debug)]
pub enum TonebenchError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    #[error("unknown subject '{name}' (available: {available})")]
    UnknownSubject { name: String, available: String },

    #[error("missing credentials for {provider}: set {variables}")]
    MissingCredentials { provider: String, variables: String },

    // Data errors (exit code 3)
    #[error("{kind} not found: {path:?}")]
    InputNotFound { kind: String, path: PathBuf },

    #[error("invalid {path:?}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("no results found in {dir:?}")]
    NoResults { dir: PathBuf },

    #[error("no responses to analyze for {subject}")]
    NoResponses { subject: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{provider} request failed: {reason}")]
    Provider { provider: String, reason: String },

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("Run interrupted. Re-run the same command to resume.")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

impl TonebenchError {
    /// Create an error for a provider call that did not produce a completion
    pub fn provider(provider: &str, reason: impl std::fmt::Display) -> Self {
        TonebenchError::Provider {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error for a required input file that does not exist
    pub fn input_not_found(kind: &str, path: impl Into<PathBuf>) -> Self {
        TonebenchError::InputNotFound {
            kind: kind.to_string(),
            path: path.into(),
        }
    }

    /// Create an error for an input file whose content cannot be used
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        TonebenchError::InvalidInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        TonebenchError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TonebenchError::UnknownFormat(_)
            | TonebenchError::UsageError(_)
            | TonebenchError::UnknownSubject { .. }
            | TonebenchError::MissingCredentials { .. } => ExitCode::Usage,

            TonebenchError::InputNotFound { .. }
            | TonebenchError::InvalidInput { .. }
            | TonebenchError::NoResults { .. }
            | TonebenchError::NoResponses { .. } => ExitCode::Data,

            TonebenchError::Io(_)
            | TonebenchError::Json(_)
            | TonebenchError::Csv(_)
            | TonebenchError::Toml(_)
            | TonebenchError::Provider { .. }
            | TonebenchError::FailedOperationWithTarget { .. }
            | TonebenchError::Interrupted
            | TonebenchError::Other(_) => ExitCode::Failure,
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }

    fn error_type(&self) -> &'static str {
        match self {
            TonebenchError::UnknownFormat(_) => "unknown_format",
            TonebenchError::UsageError(_) => "usage_error",
            TonebenchError::UnknownSubject { .. } => "unknown_subject",
            TonebenchError::MissingCredentials { .. } => "missing_credentials",
            TonebenchError::InputNotFound { .. } => "input_not_found",
            TonebenchError::InvalidInput { .. } => "invalid_input",
            TonebenchError::NoResults { .. } => "no_results",
            TonebenchError::NoResponses { .. } => "no_responses",
            TonebenchError::Io(_) => "io_error",
            TonebenchError::Json(_) => "json_error",
            TonebenchError::Csv(_) => "csv_error",
            TonebenchError::Toml(_) => "toml_error",
            TonebenchError::Provider { .. } => "provider_error",
            TonebenchError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
            TonebenchError::Interrupted => "interrupted",
            TonebenchError::Other(_) => "other",
        }
    }
}

/// Result type alias for tonebench operations
pub type Result<T> = std::result::Result<T, TonebenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_group() {
        assert_eq!(
            TonebenchError::UsageError("bad".into()).exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            TonebenchError::MissingCredentials {
                provider: "azure-openai".into(),
                variables: "AZURE_OPENAI_API_KEY".into(),
            }
            .exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            TonebenchError::input_not_found("rubric", "rubric.md").exit_code(),
            ExitCode::Data
        );
        assert_eq!(TonebenchError::Interrupted.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn test_to_json_envelope() {
        let err = TonebenchError::UnknownSubject {
            name: "Nope".into(),
            available: "GPTBot".into(),
        };
        let json = err.to_json();
        assert_eq!(json["error"]["code"], 2);
        assert_eq!(json["error"]["type"], "unknown_subject");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("unknown subject 'Nope'"));
    }
}
