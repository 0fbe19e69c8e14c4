//! Response gathering
//!
//! Asks a provider to answer every prompt and writes the answers as a
//! `{query, response}` JSONL file, the input of later evaluation runs.
//! Provider failures become inline `[ERROR: ...]` responses so a long run
//! never stops halfway because of one bad call.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::inputs::{load_responses, save_responses, GatheredResponse};
use crate::provider::{CompletionRequest, Provider};

pub const DEFAULT_GATHER_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_GATHER_TEMPERATURE: f64 = 1.0;
/// Responses are flushed to disk after this many new items
pub const SAVE_EVERY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct GatherOptions {
    pub model: String,
    pub system_prompt: Option<String>,
    /// Keep an existing output file and continue after its last line
    pub resume: bool,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GatherOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            resume: false,
            max_tokens: DEFAULT_GATHER_MAX_TOKENS,
            temperature: DEFAULT_GATHER_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatherSummary {
    pub subject: String,
    pub output: PathBuf,
    pub total: usize,
    /// Responses already present when resuming
    pub resumed: usize,
    pub generated: usize,
    pub errors: usize,
    pub interrupted: bool,
}

pub fn error_marker(message: impl std::fmt::Display) -> String {
    format!("[ERROR: {}]", message)
}

/// Generate responses for `prompts`, persisting to `output`.
///
/// `progress` is called before each prompt with `(position, total, query)`.
#[tracing::instrument(skip_all, fields(subject = %subject, provider = %provider.name(), model = %options.model))]
pub fn gather<P: Provider + ?Sized>(
    subject: &str,
    prompts: &[String],
    provider: &P,
    options: &GatherOptions,
    output: &Path,
    interrupt: Option<&AtomicBool>,
    mut progress: impl FnMut(usize, usize, &str),
) -> Result<GatherSummary> {
    let mut responses = if options.resume && output.is_file() {
        load_responses(output)?
    } else {
        Vec::new()
    };

    if responses.len() > prompts.len() {
        warn!(
            existing = responses.len(),
            prompts = prompts.len(),
            "output already has more responses than prompts"
        );
    }

    let mut summary = GatherSummary {
        subject: subject.to_string(),
        output: output.to_path_buf(),
        total: prompts.len(),
        resumed: responses.len(),
        generated: 0,
        errors: 0,
        interrupted: false,
    };
    if summary.resumed > 0 {
        info!(resumed = summary.resumed, "resuming from existing responses");
    }

    let mut unsaved = 0;
    for (position, query) in prompts.iter().enumerate().skip(responses.len()) {
        if interrupt.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            warn!(position = position + 1, "gathering interrupted");
            summary.interrupted = true;
            break;
        }

        progress(position + 1, prompts.len(), query.as_str());

        let request = CompletionRequest {
            system: options.system_prompt.as_deref(),
            user: query,
            model: &options.model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            json_object: false,
        };
        let response = match provider.invoke(&request) {
            Ok(text) => text,
            Err(e) => {
                warn!(index = position + 1, error = %e, "provider call failed");
                summary.errors += 1;
                error_marker(e)
            }
        };

        responses.push(GatheredResponse {
            query: query.clone(),
            response,
        });
        summary.generated += 1;
        unsaved += 1;

        if unsaved >= SAVE_EVERY {
            save_responses(output, &responses)?;
            unsaved = 0;
        }
    }

    if unsaved > 0 || !output.exists() {
        save_responses(output, &responses)?;
    }

    info!(
        generated = summary.generated,
        errors = summary.errors,
        interrupted = summary.interrupted,
        "gathering complete"
    );
    Ok(summary)
}
