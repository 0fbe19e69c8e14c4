//! Judge invocation adapter
//!
//! Turns one (query, response) pair into an [`EvaluationRecord`] by asking a
//! judge model to score it against the rubric. Every outcome is a record:
//! transport errors and empty completions become error records rather than
//! propagating, so the batch loop always has something uniform to persist.

use tracing::{debug, warn};

use crate::extract::extract;
use crate::parse::parse;
use crate::provider::{CompletionRequest, Provider};
use crate::record::EvaluationRecord;

/// Default sampling temperature for judging
pub const DEFAULT_JUDGE_TEMPERATURE: f64 = 0.0;
/// Default output budget for judge completions
pub const DEFAULT_JUDGE_MAX_TOKENS: u32 = 4000;

pub const EMPTY_RESPONSE_ERROR: &str = "Empty response from API";
pub const NO_JSON_ERROR: &str = "Could not extract JSON from response";

const JSON_ONLY_INSTRUCTION: &str = "Please evaluate the \"Response to Evaluate\" against the ideal character defined in your instructions. Return your evaluation ONLY as valid JSON in the exact format specified. Do not include any text before or after the JSON.";

/// Something that can score a response to a query.
pub trait Judge {
    fn evaluate(&self, query: &str, response: &str) -> EvaluationRecord;
}

/// Sampling parameters for judge calls
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl JudgeOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_JUDGE_TEMPERATURE,
            max_tokens: DEFAULT_JUDGE_MAX_TOKENS,
        }
    }
}

/// [`Judge`] backed by a model [`Provider`] and a rubric.
pub struct JudgeAdapter<P: Provider> {
    provider: P,
    rubric: String,
    options: JudgeOptions,
}

impl<P: Provider> JudgeAdapter<P> {
    pub fn new(provider: P, rubric: impl Into<String>, options: JudgeOptions) -> Self {
        Self {
            provider,
            rubric: rubric.into(),
            options,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> Judge for JudgeAdapter<P> {
    #[tracing::instrument(skip_all, fields(provider = %self.provider.name(), model = %self.options.model))]
    fn evaluate(&self, query: &str, response: &str) -> EvaluationRecord {
        let message = build_evaluation_message(query, response);
        let request = CompletionRequest {
            system: Some(&self.rubric),
            user: &message,
            model: &self.options.model,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            json_object: true,
        };

        let raw = match self.provider.invoke(&request) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "judge call failed");
                return EvaluationRecord::failed(e.to_string());
            }
        };

        if raw.trim().is_empty() {
            warn!("judge returned an empty completion");
            return EvaluationRecord::failed(EMPTY_RESPONSE_ERROR);
        }

        debug!(chars = raw.len(), "judge completion received");

        match extract(&raw) {
            Some(candidate) => parse(candidate),
            None => EvaluationRecord::failed(NO_JSON_ERROR),
        }
    }
}

/// Data message for one judged item.
pub fn build_evaluation_message(query: &str, response: &str) -> String {
    format!(
        "**User Query:**\n{}\n\n**Response to Evaluate:**\n{}\n\n---\n\n{}",
        query, response, JSON_ONLY_INSTRUCTION
    )
}
