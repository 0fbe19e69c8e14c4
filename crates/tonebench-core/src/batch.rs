//! Resumable batch evaluation
//!
//! Items are judged one at a time in index order and saved immediately, so
//! an interrupted run loses at most the item in flight. Re-running the same
//! command picks up where the last run stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::judge::Judge;
use crate::store::ResultStore;
use crate::trace_time;

/// Which items a run judges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Judge everything not already done
    Full,
    /// Judge only items that need retry
    RetryFailed,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Full => "full",
            RunMode::RetryFailed => "retry_failed",
        }
    }
}

/// One (query, response) pair at a fixed 1-based index
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub index: u32,
    pub query: String,
    pub response: String,
}

/// Pair prompts with gathered responses by position.
///
/// When the counts differ only the common prefix is kept.
pub fn build_items(prompts: &[String], responses: &[String]) -> Vec<Item> {
    if prompts.len() != responses.len() {
        warn!(
            prompts = prompts.len(),
            responses = responses.len(),
            "prompt and response counts differ, evaluating common prefix only"
        );
    }

    prompts
        .iter()
        .zip(responses)
        .enumerate()
        .map(|(i, (query, response))| Item {
            index: (i + 1) as u32,
            query: query.clone(),
            response: response.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub evaluated: usize,
    pub skipped: usize,
    /// Newly written records that still need retry
    pub failed: usize,
    pub interrupted: bool,
}

/// Callback invoked before each item is judged: `(position, total, item)`
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize, &Item);

pub struct BatchRun<'a> {
    pub subject: &'a str,
    pub mode: RunMode,
    pub judge: &'a dyn Judge,
    pub store: &'a ResultStore,
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl BatchRun<'_> {
    /// Count of items already done (full) or pending retry (retry-failed)
    pub fn preview(&self, items: &[Item]) -> usize {
        items
            .iter()
            .filter(|item| {
                let failed = self.store.is_failed(self.subject, item.index);
                match self.mode {
                    RunMode::Full => !failed,
                    RunMode::RetryFailed => failed,
                }
            })
            .count()
    }

    fn should_skip(&self, index: u32) -> bool {
        match self.mode {
            RunMode::Full => {
                self.store.exists(self.subject, index) && !self.store.is_failed(self.subject, index)
            }
            RunMode::RetryFailed => !self.store.is_failed(self.subject, index),
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Judge and persist every item that needs it.
    ///
    /// Judge problems never abort the run; a failed save does.
    #[tracing::instrument(skip_all, fields(subject = %self.subject, mode = %self.mode.as_str(), items = items.len()))]
    pub fn run(&self, items: &[Item], mut progress: Option<Progress<'_>>) -> Result<BatchSummary> {
        let mut summary = BatchSummary {
            total: items.len(),
            ..BatchSummary::default()
        };

        for (position, item) in items.iter().enumerate() {
            if self.interrupted() {
                warn!(remaining = items.len() - position, "run interrupted");
                summary.interrupted = true;
                break;
            }

            if self.should_skip(item.index) {
                summary.skipped += 1;
                continue;
            }

            if let Some(callback) = progress.as_mut() {
                callback(position + 1, items.len(), item);
            }

            let start = Instant::now();
            let record = self.judge.evaluate(&item.query, &item.response);
            trace_time!(start, "judge_item", index = item.index);
            let failed = record.is_error() || record.is_partial();

            self.store.save(self.subject, item.index, &item.query, record)?;

            summary.evaluated += 1;
            if failed {
                summary.failed += 1;
            }
            info!(index = item.index, failed, "item_judged");
        }

        info!(
            evaluated = summary.evaluated,
            skipped = summary.skipped,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "batch complete"
        );
        Ok(summary)
    }
}
