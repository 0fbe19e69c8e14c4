//! Cross-subject aggregation of judged results
//!
//! Purely computed from loaded [`ResultFile`]s; the only side effects are
//! the two artifacts written by [`merge`].

mod report;
mod table;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::{Result, TonebenchError};
use crate::record::{Dimension, ResultFile};
use crate::store::{io::write_atomic, ResultStore};

pub use report::render_report;
pub use table::write_csv;

pub const CSV_FILE: &str = "scores_summary.csv";
pub const REPORT_FILE: &str = "summary_report.txt";

/// Averages for one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub count: usize,
    pub average_overall: f64,
    /// Per-dimension averages; dimensions a record omits count as 0
    pub dimension_averages: BTreeMap<Dimension, f64>,
    pub average_bullets: f64,
    pub best: (Dimension, f64),
    pub worst: (Dimension, f64),
}

impl SubjectSummary {
    pub fn dimension(&self, dimension: Dimension) -> f64 {
        self.dimension_averages
            .get(&dimension)
            .copied()
            .unwrap_or(0.0)
    }

    /// Dimensions sorted by average, highest first
    pub fn dimensions_descending(&self) -> Vec<(Dimension, f64)> {
        let mut dims: Vec<(Dimension, f64)> = Dimension::ALL
            .iter()
            .map(|d| (*d, self.dimension(*d)))
            .collect();
        dims.sort_by(|a, b| b.1.total_cmp(&a.1));
        dims
    }
}

/// The dimension whose subject averages spread the furthest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Differentiator {
    pub dimension: Dimension,
    pub spread: f64,
    /// Subject averages for this dimension, by subject name
    pub scores: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    /// One entry per subject, sorted by name
    pub subjects: Vec<SubjectSummary>,
    /// Max minus min of subject averages per dimension
    pub spread: BTreeMap<Dimension, f64>,
    pub differentiator: Option<Differentiator>,
}

impl AggregateSummary {
    /// Subjects ordered by average overall score, highest first
    pub fn ranking(&self) -> Vec<&SubjectSummary> {
        let mut ranked: Vec<&SubjectSummary> = self.subjects.iter().collect();
        ranked.sort_by(|a, b| {
            b.average_overall
                .total_cmp(&a.average_overall)
                .then_with(|| a.subject.cmp(&b.subject))
        });
        ranked
    }

    pub fn total_results(&self) -> usize {
        self.subjects.iter().map(|s| s.count).sum()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// First maximum (or minimum) in canonical dimension order
fn extreme(averages: &BTreeMap<Dimension, f64>, pick_max: bool) -> (Dimension, f64) {
    let mut best = (Dimension::ALL[0], averages.get(&Dimension::ALL[0]).copied().unwrap_or(0.0));
    for dimension in Dimension::ALL.iter().skip(1) {
        let value = averages.get(dimension).copied().unwrap_or(0.0);
        let better = if pick_max { value > best.1 } else { value < best.1 };
        if better {
            best = (*dimension, value);
        }
    }
    best
}

fn summarize_subject(subject: &str, results: &[&ResultFile]) -> SubjectSummary {
    let dimension_averages: BTreeMap<Dimension, f64> = Dimension::ALL
        .iter()
        .map(|d| (*d, mean(results.iter().map(|r| r.evaluation.dimension(*d)))))
        .collect();

    SubjectSummary {
        subject: subject.to_string(),
        count: results.len(),
        average_overall: mean(results.iter().map(|r| r.evaluation.overall_score)),
        average_bullets: mean(
            results
                .iter()
                .map(|r| f64::from(r.evaluation.bullet_point_analysis.bullet_count)),
        ),
        best: extreme(&dimension_averages, true),
        worst: extreme(&dimension_averages, false),
        dimension_averages,
    }
}

/// Compute per-subject and cross-subject statistics.
pub fn summarize(results: &[ResultFile]) -> AggregateSummary {
    let mut grouped: BTreeMap<&str, Vec<&ResultFile>> = BTreeMap::new();
    for result in results {
        grouped
            .entry(result.subject_name.as_str())
            .or_default()
            .push(result);
    }

    let subjects: Vec<SubjectSummary> = grouped
        .iter()
        .map(|(subject, results)| summarize_subject(subject, results))
        .collect();

    let mut spread = BTreeMap::new();
    let mut differentiator = None;

    if subjects.len() >= 2 {
        for dimension in Dimension::ALL {
            let values = subjects.iter().map(|s| s.dimension(dimension));
            let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
            let min = values.fold(f64::INFINITY, f64::min);
            spread.insert(dimension, max - min);
        }

        let (dimension, range) = extreme(&spread, true);
        differentiator = Some(Differentiator {
            dimension,
            spread: range,
            scores: subjects
                .iter()
                .map(|s| (s.subject.clone(), s.dimension(dimension)))
                .collect(),
        });
    }

    AggregateSummary {
        subjects,
        spread,
        differentiator,
    }
}

/// Paths written by [`merge`]
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutput {
    pub csv: PathBuf,
    pub report: PathBuf,
    pub summary: AggregateSummary,
    /// Files that could not be read, with reasons
    pub skipped: Vec<(PathBuf, String)>,
}

/// Load every result in `store` and write the CSV table and text report.
pub fn merge(store: &ResultStore) -> Result<MergeOutput> {
    let loaded = store.load_all(None)?;
    if loaded.results.is_empty() {
        return Err(TonebenchError::NoResults {
            dir: store.individual_dir().to_path_buf(),
        });
    }

    let summary = summarize(&loaded.results);
    fs::create_dir_all(store.results_dir()).map_err(|e| {
        TonebenchError::io_operation("create directory", store.results_dir().display(), e)
    })?;

    let csv_path = store.results_dir().join(CSV_FILE);
    let mut table = Vec::new();
    write_csv(&loaded.results, &mut table)?;
    write_atomic(&csv_path, |w| std::io::Write::write_all(w, &table))?;

    let report_path = store.results_dir().join(REPORT_FILE);
    let report = render_report(&summary);
    write_atomic(&report_path, |w| std::io::Write::write_all(w, report.as_bytes()))?;

    info!(
        results = loaded.results.len(),
        subjects = summary.subjects.len(),
        skipped = loaded.skipped.len(),
        "merge complete"
    );

    Ok(MergeOutput {
        csv: csv_path,
        report: report_path,
        summary,
        skipped: loaded.skipped,
    })
}
