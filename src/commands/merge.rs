//! `tonebench merge` command - combine saved results into reports
//!
//! Writes `scores_summary.csv` and `summary_report.txt` into the results
//! directory and prints the report.

use crate::commands::dispatch::CommandContext;
use tonebench_core::aggregate::{merge, render_report};
use tonebench_core::error::Result;
use tonebench_core::format::OutputFormat;

/// Execute the merge command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let cli = ctx.cli;
    let output = merge(&ctx.store())?;

    match cli.format {
        OutputFormat::Json => {
            let skipped: Vec<serde_json::Value> = output
                .skipped
                .iter()
                .map(|(path, reason)| {
                    serde_json::json!({ "path": path.display().to_string(), "reason": reason })
                })
                .collect();
            let json = serde_json::json!({
                "status": "ok",
                "results": output.summary.total_results(),
                "csv": output.csv.display().to_string(),
                "report": output.report.display().to_string(),
                "ranking": output
                    .summary
                    .ranking()
                    .iter()
                    .map(|s| serde_json::json!({ "subject": s.subject, "average_overall": s.average_overall }))
                    .collect::<Vec<_>>(),
                "summary": &output.summary,
                "skipped": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!(
                    "Loaded {} results from {} subject(s)",
                    output.summary.total_results(),
                    output.summary.subjects.len()
                );
                if !output.skipped.is_empty() {
                    println!("Skipped {} unreadable file(s)", output.skipped.len());
                }
                println!("CSV saved to {}", output.csv.display());
                println!("Report saved to {}", output.report.display());
                println!();
                print!("{}", render_report(&output.summary));
            }
        }
    }

    Ok(())
}
