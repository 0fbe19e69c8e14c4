//! `tonebench failures` command - list results that need re-judging
//!
//! Without `--subject` every configured subject is scanned, plus any
//! subject that only appears in the results directory.

use std::collections::BTreeSet;

use crate::commands::dispatch::CommandContext;
use tonebench_core::error::Result;
use tonebench_core::failures::{retry_command, scan};
use tonebench_core::format::OutputFormat;

/// Execute the failures command
pub fn execute(ctx: &CommandContext, subject: Option<&str>) -> Result<()> {
    let cli = ctx.cli;

    let store = ctx.store();

    let subjects = match subject {
        Some(name) => {
            ctx.config.subject(name)?;
            vec![name.to_string()]
        }
        None => {
            let mut names: BTreeSet<String> = ctx.config.subject_names().into_iter().collect();
            names.extend(store.subjects()?);
            names.into_iter().collect()
        }
    };

    let prompt_count = ctx.load_prompts()?.len() as u32;
    let report = scan(&store, &subjects, prompt_count)?;

    match cli.format {
        OutputFormat::Json => {
            let retry: Vec<String> = report
                .failing_subjects()
                .map(|s| retry_command(&s.subject))
                .collect();
            let counts: serde_json::Map<String, serde_json::Value> = report
                .failing_subjects()
                .map(|s| (s.subject.clone(), serde_json::json!(s.counts_by_kind())))
                .collect();
            let output = serde_json::json!({
                "total": report.total,
                "failed": report.failed,
                "success_rate": report.success_rate(),
                "subjects": &report.by_subject,
                "counts_by_kind": counts,
                "retry_commands": retry,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if cli.quiet {
                if report.failed > 0 {
                    println!("{} failed evaluations", report.failed);
                }
            } else {
                print!("{}", report.render());
            }
        }
    }

    Ok(())
}
