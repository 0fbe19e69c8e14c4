//! Loading of prompts, gathered responses and the rubric

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bail_missing_input;
use crate::error::{Result, TonebenchError};
use crate::store::io::write_atomic;

/// One line of a gathered-responses file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatheredResponse {
    #[serde(default)]
    pub query: String,
    pub response: String,
}

/// Read the `column` of a CSV prompts file, one prompt per row in order.
pub fn load_prompts(path: &Path, column: &str) -> Result<Vec<String>> {
    if !path.is_file() {
        bail_missing_input!("prompts file", path);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let Some(position) = headers.iter().position(|h| h.trim_start_matches('\u{feff}') == column)
    else {
        return Err(TonebenchError::invalid_input(
            path,
            format!("missing column '{}'", column),
        ));
    };

    let mut prompts = Vec::new();
    for row in reader.records() {
        let row = row?;
        prompts.push(row.get(position).unwrap_or_default().to_string());
    }

    debug!(path = %path.display(), count = prompts.len(), "loaded prompts");
    Ok(prompts)
}

/// Read a JSONL file of `{query, response}` records. Blank lines are ignored.
pub fn load_responses(path: &Path) -> Result<Vec<GatheredResponse>> {
    if !path.is_file() {
        bail_missing_input!("responses file", path);
    }

    let content = fs::read_to_string(path)?;
    let mut responses = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: GatheredResponse = serde_json::from_str(line).map_err(|e| {
            TonebenchError::invalid_input(path, format!("line {}: {}", line_no + 1, e))
        })?;
        responses.push(record);
    }

    debug!(path = %path.display(), count = responses.len(), "loaded responses");
    Ok(responses)
}

/// Rewrite a responses file atomically, one JSON object per line.
pub fn save_responses(path: &Path, responses: &[GatheredResponse]) -> Result<()> {
    write_atomic(path, |writer| {
        for response in responses {
            serde_json::to_writer(&mut *writer, response)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    })
}

pub fn load_rubric(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail_missing_input!("rubric file", path);
    }
    let rubric = fs::read_to_string(path)?;
    if rubric.trim().is_empty() {
        return Err(TonebenchError::invalid_input(path, "rubric is empty"));
    }
    Ok(rubric)
}
