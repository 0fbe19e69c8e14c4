//! Retry classification and failure scanning
//!
//! [`classify`] is the one definition of "needs retry" shared by the store,
//! the batch orchestrator and the failure report. It looks only at explicit
//! markers; a record that scored 0 with no markers is done.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TonebenchError};
use crate::format::truncate_chars;
use crate::record::ResultFile;
use crate::store::ResultStore;

const MAX_REASON_CHARS: usize = 100;

/// Why an item has to be judged (again)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Never attempted
    Missing,
    /// File exists but is not a readable result
    Unreadable(String),
    /// Judge call or parse failed outright
    JudgeError(String),
    /// Scores were rescued from malformed judge output
    PartialParse,
}

impl FailureReason {
    /// Grouping key that ignores per-item detail
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::Missing => "missing",
            FailureReason::Unreadable(_) => "unreadable",
            FailureReason::JudgeError(_) => "judge_error",
            FailureReason::PartialParse => "partial_parse",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Missing => f.write_str("Not yet evaluated"),
            FailureReason::Unreadable(reason) => {
                write!(f, "Could not read file: {}", truncate_chars(reason, MAX_REASON_CHARS))
            }
            FailureReason::JudgeError(message) => {
                write!(f, "Error: {}", truncate_chars(message, MAX_REASON_CHARS))
            }
            FailureReason::PartialParse => f.write_str("JSON parsing issue (partial parse)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Done,
    NeedsRetry(FailureReason),
}

impl ItemStatus {
    pub fn needs_retry(&self) -> bool {
        matches!(self, ItemStatus::NeedsRetry(_))
    }

    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            ItemStatus::Done => None,
            ItemStatus::NeedsRetry(reason) => Some(reason),
        }
    }
}

/// Classify a stored item: `None` when no file exists, `Some(Err)` when the
/// file could not be read as a result.
pub fn classify(entry: Option<Result<ResultFile>>) -> ItemStatus {
    let result = match entry {
        None => return ItemStatus::NeedsRetry(FailureReason::Missing),
        Some(Err(e)) => return ItemStatus::NeedsRetry(FailureReason::Unreadable(e.to_string())),
        Some(Ok(result)) => result,
    };

    let record = &result.evaluation;
    if record.is_error() {
        let message = record
            .error
            .clone()
            .unwrap_or_else(|| "judging failed".to_string());
        return ItemStatus::NeedsRetry(FailureReason::JudgeError(message));
    }
    if record.is_partial() {
        return ItemStatus::NeedsRetry(FailureReason::PartialParse);
    }
    ItemStatus::Done
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: u32,
    pub reason: FailureReason,
}

/// Failures for one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectFailures {
    pub subject: String,
    pub failures: Vec<ItemFailure>,
    /// Result files whose index falls outside the current prompt list
    pub stray: Vec<PathBuf>,
}

impl SubjectFailures {
    /// Failed indices grouped by reason text, in reason order
    pub fn grouped(&self) -> BTreeMap<String, Vec<u32>> {
        let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for failure in &self.failures {
            groups
                .entry(failure.reason.to_string())
                .or_default()
                .push(failure.index);
        }
        groups
    }

    /// Counts per reason kind
    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    /// Items checked (subjects x prompt count)
    pub total: usize,
    pub failed: usize,
    pub by_subject: Vec<SubjectFailures>,
}

impl FailureReport {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.failed) as f64 / self.total as f64 * 100.0
    }

    /// Subjects with at least one failure
    pub fn failing_subjects(&self) -> impl Iterator<Item = &SubjectFailures> {
        self.by_subject.iter().filter(|s| !s.failures.is_empty())
    }

    /// Plain-text report with retry commands
    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = String::new();

        let _ = writeln!(out, "Checking evaluation results...");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total evaluations: {}", self.total);
        let _ = writeln!(out, "Failed evaluations: {}", self.failed);
        let _ = writeln!(out, "Success rate: {:.1}%", self.success_rate());
        let _ = writeln!(out);

        for subject in self.by_subject.iter().filter(|s| !s.stray.is_empty()) {
            let _ = writeln!(
                out,
                "{}: {} result file(s) outside the current prompt list",
                subject.subject,
                subject.stray.len()
            );
        }

        if self.failed == 0 {
            let _ = writeln!(out, "No failed evaluations found!");
            return out;
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "FAILED EVALUATIONS BY SUBJECT");
        let _ = writeln!(out, "{}", rule);

        for subject in self.failing_subjects() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}: {} failures", subject.subject, subject.failures.len());
            let _ = writeln!(out, "{}", "-".repeat(80));
            for (reason, indices) in subject.grouped() {
                let list = indices
                    .iter()
                    .map(|i| format!("{:03}", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "  {}", reason);
                let _ = writeln!(out, "  Queries: {}", list);
                let _ = writeln!(out);
            }
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "TO RETRY FAILED EVALUATIONS:");
        let _ = writeln!(out, "{}", rule);
        for subject in self.failing_subjects() {
            let _ = writeln!(out, "{}", retry_command(&subject.subject));
        }

        out
    }
}

pub fn retry_command(subject: &str) -> String {
    format!("tonebench evaluate {} --retry-failed", subject)
}

/// Scan `subjects` over indices `1..=prompt_count`.
pub fn scan(store: &ResultStore, subjects: &[String], prompt_count: u32) -> Result<FailureReport> {
    let mut report = FailureReport {
        total: 0,
        failed: 0,
        by_subject: Vec::with_capacity(subjects.len()),
    };

    for subject in subjects {
        let mut entry = SubjectFailures {
            subject: subject.clone(),
            failures: Vec::new(),
            stray: stray_files(store, subject, prompt_count)?,
        };

        for index in 1..=prompt_count {
            report.total += 1;
            if let ItemStatus::NeedsRetry(reason) = store.status(subject, index) {
                entry.failures.push(ItemFailure { index, reason });
            }
        }

        debug!(subject = %subject, failed = entry.failures.len(), stray = entry.stray.len(), "scanned subject");
        report.failed += entry.failures.len();
        report.by_subject.push(entry);
    }

    Ok(report)
}

fn stray_files(store: &ResultStore, subject: &str, prompt_count: u32) -> Result<Vec<PathBuf>> {
    let dir = store.individual_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}_query_", subject);
    let mut stray = Vec::new();
    let entries =
        std::fs::read_dir(dir).map_err(|e| TonebenchError::io_operation("scan", dir.display(), e))?;

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(index) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            continue;
        };
        if index == 0 || index > prompt_count {
            stray.push(entry.path());
        }
    }

    stray.sort();
    Ok(stray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EvaluationRecord;
    use tempfile::tempdir;

    fn result(record: EvaluationRecord) -> ResultFile {
        ResultFile::new("A", 1, "q", record)
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(classify(None), ItemStatus::NeedsRetry(FailureReason::Missing));

        let unreadable = classify(Some(Err(TonebenchError::Other("bad".into()))));
        assert!(matches!(unreadable, ItemStatus::NeedsRetry(FailureReason::Unreadable(_))));

        let error = classify(Some(Ok(result(EvaluationRecord::failed("Empty response from API")))));
        assert_eq!(
            error,
            ItemStatus::NeedsRetry(FailureReason::JudgeError("Empty response from API".into()))
        );

        let partial = EvaluationRecord {
            parse_warning: Some("rescued".into()),
            overall_score: 6.0,
            ..EvaluationRecord::default()
        };
        assert_eq!(
            classify(Some(Ok(result(partial)))),
            ItemStatus::NeedsRetry(FailureReason::PartialParse)
        );
    }

    #[test]
    fn test_zero_score_without_markers_is_done() {
        let zero = EvaluationRecord::default();
        assert_eq!(classify(Some(Ok(result(zero)))), ItemStatus::Done);
    }

    #[test]
    fn test_legacy_error_without_flag_still_needs_retry() {
        let legacy = EvaluationRecord {
            error: Some("Request timed out".into()),
            ..EvaluationRecord::default()
        };
        assert!(classify(Some(Ok(result(legacy)))).needs_retry());
    }

    #[test]
    fn test_scan_groups_and_reports() {
        let dir = tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let scored = |s: f64| EvaluationRecord {
            overall_score: s,
            ..EvaluationRecord::default()
        };

        store.save("A", 1, "q", scored(8.0)).unwrap();
        store.save("A", 2, "q", EvaluationRecord::failed("boom")).unwrap();
        store.save("A", 3, "q", EvaluationRecord::failed("boom")).unwrap();
        store.save("A", 9, "q", scored(5.0)).unwrap();
        for i in 1..=4 {
            store.save("B", i, "q", scored(7.0)).unwrap();
        }

        let subjects = vec!["A".to_string(), "B".to_string()];
        let report = scan(&store, &subjects, 4).unwrap();

        assert_eq!(report.total, 8);
        assert_eq!(report.failed, 3);
        let a = &report.by_subject[0];
        assert_eq!(a.failures.iter().map(|f| f.index).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(a.counts_by_kind()["judge_error"], 2);
        assert_eq!(a.counts_by_kind()["missing"], 1);
        assert_eq!(a.stray.len(), 1);
        assert!(report.by_subject[1].failures.is_empty());

        let text = report.render();
        assert!(text.contains("Failed evaluations: 3"));
        assert!(text.contains("Error: boom"));
        assert!(text.contains("Queries: 002, 003"));
        assert!(text.contains("tonebench evaluate A --retry-failed"));
        assert!(!text.contains("evaluate B --retry-failed"));
    }

    #[test]
    fn test_clean_report() {
        let dir = tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        store
            .save("A", 1, "q", EvaluationRecord { overall_score: 9.0, ..Default::default() })
            .unwrap();

        let report = scan(&store, &["A".to_string()], 1).unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(report.success_rate(), 100.0);
        assert!(report.render().contains("No failed evaluations found!"));
    }
}
