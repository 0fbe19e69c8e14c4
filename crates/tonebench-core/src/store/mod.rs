//! Per-item result store
//!
//! One JSON file per (subject, index) under `<results_dir>/individual/`.
//! The directory is the single source of truth for what has been judged;
//! every write replaces a whole file atomically.

pub mod io;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, TonebenchError};
use crate::failures::{classify, ItemStatus};
use crate::record::{EvaluationRecord, ResultFile};

/// Subdirectory of the results dir holding per-item files
pub const INDIVIDUAL_DIR: &str = "individual";

/// File name for one item: `<subject>_query_<NNN>.json`
pub fn file_name(subject: &str, index: u32) -> String {
    format!("{}_query_{:03}.json", subject, index)
}

/// Results read back from disk, with any files that could not be used
#[derive(Debug, Default)]
pub struct LoadedResults {
    pub results: Vec<ResultFile>,
    pub skipped: Vec<(PathBuf, String)>,
}

/// Filesystem-backed store of judged items
#[derive(Debug, Clone)]
pub struct ResultStore {
    results_dir: PathBuf,
    dir: PathBuf,
}

impl ResultStore {
    /// Store rooted at `results_dir`; nothing is created until the first save
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let results_dir = results_dir.into();
        let dir = results_dir.join(INDIVIDUAL_DIR);
        Self { results_dir, dir }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn individual_dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, subject: &str, index: u32) -> PathBuf {
        self.dir.join(file_name(subject, index))
    }

    pub fn exists(&self, subject: &str, index: u32) -> bool {
        self.path_for(subject, index).is_file()
    }

    /// Load one item. `Ok(None)` when it was never saved; an error when the
    /// file exists but is not a readable result.
    pub fn load(&self, subject: &str, index: u32) -> Result<Option<ResultFile>> {
        let path = self.path_for(subject, index);
        if !path.is_file() {
            return Ok(None);
        }
        read_result(&path).map(Some)
    }

    /// Retry status of one item
    pub fn status(&self, subject: &str, index: u32) -> ItemStatus {
        classify(self.load(subject, index).transpose())
    }

    /// True for every item that still needs judging, missing ones included
    pub fn is_failed(&self, subject: &str, index: u32) -> bool {
        self.status(subject, index).needs_retry()
    }

    /// Subjects that have at least one result file, from file names alone
    pub fn subjects(&self) -> Result<Vec<String>> {
        let mut subjects = BTreeSet::new();
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                TonebenchError::io_operation("scan", self.dir.display(), e)
            })?;
            if !entry.file_type().is_file() || io::is_temp_file(entry.path()) {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let subject = name
                .strip_suffix(".json")
                .and_then(|stem| stem.rsplit_once("_query_"))
                .filter(|(subject, digits)| {
                    !subject.is_empty() && digits.parse::<u32>().is_ok()
                })
                .map(|(subject, _)| subject.to_string());
            if let Some(subject) = subject {
                subjects.insert(subject);
            }
        }

        Ok(subjects.into_iter().collect())
    }

    /// Persist a judged item, replacing any previous result for the key
    pub fn save(
        &self,
        subject: &str,
        index: u32,
        user_query: &str,
        record: EvaluationRecord,
    ) -> Result<PathBuf> {
        let path = self.path_for(subject, index);
        let result = ResultFile::new(subject, index, user_query, record);

        io::write_atomic(&path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &result)?;
            std::io::Write::write_all(writer, b"\n")
        })?;

        debug!(subject, index, path = %path.display(), "result_saved");
        Ok(path)
    }

    /// Read every result file, optionally for one subject only.
    ///
    /// Unreadable files are reported in `skipped` and logged, never fatal.
    /// Results come back sorted by subject then index.
    pub fn load_all(&self, subject: Option<&str>) -> Result<LoadedResults> {
        let mut loaded = LoadedResults::default();
        if !self.dir.is_dir() {
            return Ok(loaded);
        }

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                TonebenchError::io_operation("scan", self.dir.display(), e)
            })?;
            let path = entry.path();

            if !entry.file_type().is_file()
                || io::is_temp_file(path)
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            if let Some(subject) = subject {
                let prefix = format!("{}_query_", subject);
                let matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix));
                if !matches {
                    continue;
                }
            }

            match read_result(path) {
                Ok(result) => {
                    if subject.is_none_or(|s| result.subject_name == s) {
                        loaded.results.push(result);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable result file");
                    loaded.skipped.push((path.to_path_buf(), e.to_string()));
                }
            }
        }

        loaded.results.sort_by(|a, b| {
            a.subject_name
                .cmp(&b.subject_name)
                .then(a.query_index.cmp(&b.query_index))
        });
        loaded.skipped.sort();

        Ok(loaded)
    }
}

fn read_result(path: &Path) -> Result<ResultFile> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| TonebenchError::invalid_input(path, e))
}
