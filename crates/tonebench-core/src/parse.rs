//! Evaluation record validation and normalization
//!
//! [`parse`] turns a candidate JSON string into an [`EvaluationRecord`] and
//! never fails. Each fallback tier leaves a visible marker on the record so
//! downstream consumers can tell a real score from a rescued one:
//!
//! 1. direct parse: record as emitted (warning only if `overall_score` is absent)
//! 2. cleaned parse: re-bracket, escape raw control characters inside strings,
//!    drop trailing commas
//! 3. regex rescue: scores pulled out one by one, `parse_warning` set
//! 4. total failure: `error` set, `judging_failed` set

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::brace_span;
use crate::format::truncate_chars;
use crate::record::{BulletPointAnalysis, Dimension, EvaluationRecord};

/// Placeholder for qualitative list fields of a rescued record
pub const PARTIAL_PARSE_NOTE: &str = "(Partial parse - JSON was malformed)";
/// Placeholder for qualitative text fields of a rescued record
pub const PARSE_ERROR_NOTE: &str = "N/A (parsing error)";
/// Warning attached when scores were recovered by pattern matching
pub const RESCUE_WARNING: &str = "JSON was malformed, scores extracted via regex";
/// Warning attached when pattern matching found no scores at all
pub const RESCUE_EMPTY_WARNING: &str = "JSON was malformed, no scores could be extracted";
/// Warning attached when otherwise valid output omits the overall score
pub const MISSING_OVERALL_WARNING: &str = "overall_score missing from judge output";

const OVERALL_KEY: &str = "overall_score";
const MAX_ERROR_CHARS: usize = 200;

/// Parse a candidate JSON string into a canonical record. Never fails.
pub fn parse(candidate: &str) -> EvaluationRecord {
    if let Some(record) = parse_structured(candidate) {
        return record;
    }

    if let Some(record) = parse_cleaned(candidate) {
        debug!("judge output parsed after cleaning");
        return record;
    }

    match rescue_scores(candidate) {
        Ok(record) => {
            warn!(
                overall_score = record.overall_score,
                "judge output malformed, scores rescued by pattern matching"
            );
            record
        }
        Err(e) => {
            let message = e.to_string();
            EvaluationRecord::failed(format!(
                "JSON parse failed completely: {}",
                truncate_chars(&message, MAX_ERROR_CHARS)
            ))
        }
    }
}

/// Strict parse of a JSON object into a record.
fn parse_structured(text: &str) -> Option<EvaluationRecord> {
    let value: Value = serde_json::from_str(text).ok()?;
    let Value::Object(map) = value else {
        return None;
    };

    let has_overall = map.get(OVERALL_KEY).is_some_and(|v| {
        crate::record::value_as_f64(v).is_some()
    });

    let mut record: EvaluationRecord = serde_json::from_value(Value::Object(map)).ok()?;
    if !has_overall && record.error.is_none() && record.parse_warning.is_none() {
        record.parse_warning = Some(MISSING_OVERALL_WARNING.to_string());
    }
    Some(record)
}

/// Second tier: re-bracket, escape control characters inside strings and
/// drop trailing commas.
///
/// Text without any `{ ... }` span is not treated as an empty object; it
/// falls through to the rescue tier so the degradation stays visible.
fn parse_cleaned(candidate: &str) -> Option<EvaluationRecord> {
    let span = brace_span(candidate)?;
    parse_structured(&strip_trailing_commas(&escape_string_controls(span)))
}

/// Remove commas that directly precede a closing `}` or `]`.
///
/// Commas inside string literals are kept.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }

    out
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Structural whitespace between tokens is left alone.
pub fn escape_string_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

fn score_pattern(key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#""{}"\s*:\s*"?(-?[0-9]+(?:\.[0-9]+)?)"#,
        regex::escape(key)
    ))
}

fn find_score(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Third tier: pull scores out of malformed output one pattern at a time.
fn rescue_scores(text: &str) -> Result<EvaluationRecord, regex::Error> {
    let overall = find_score(&score_pattern(OVERALL_KEY)?, text);
    let mut found_any = overall.is_some();

    let mut record = EvaluationRecord {
        overall_score: overall.unwrap_or(0.0),
        strengths: vec![PARTIAL_PARSE_NOTE.to_string()],
        weaknesses: vec![PARTIAL_PARSE_NOTE.to_string()],
        most_ideal_aspect: PARSE_ERROR_NOTE.to_string(),
        least_ideal_aspect: PARSE_ERROR_NOTE.to_string(),
        bullet_point_analysis: BulletPointAnalysis {
            bullet_count: 0,
            prose_percentage: "N/A".to_string(),
            notes: PARSE_ERROR_NOTE.to_string(),
        },
        specific_feedback: vec![PARTIAL_PARSE_NOTE.to_string()],
        ..EvaluationRecord::default()
    };

    for dimension in Dimension::ALL {
        let score = find_score(&score_pattern(dimension.as_str())?, text);
        found_any |= score.is_some();
        record
            .dimension_scores
            .insert(dimension.as_str().to_string(), score.unwrap_or(0.0));
    }

    record.parse_warning = Some(if found_any {
        RESCUE_WARNING.to_string()
    } else {
        RESCUE_EMPTY_WARNING.to_string()
    });

    Ok(record)
}
