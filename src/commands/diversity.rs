//! `tonebench diversity` command - measure opening variety

use std::path::Path;

use crate::commands::dispatch::CommandContext;
use tonebench_core::diversity::analyze;
use tonebench_core::error::Result;
use tonebench_core::format::OutputFormat;
use tonebench_core::inputs::load_responses;

/// Execute the diversity command
pub fn execute(ctx: &CommandContext, subject: &str, responses: Option<&Path>) -> Result<()> {
    let cli = ctx.cli;

    let path = match responses {
        Some(path) => ctx.paths.root.join(path),
        None => ctx.config.responses_path(&ctx.paths.root, subject),
    };
    let texts: Vec<String> = load_responses(&path)?
        .into_iter()
        .map(|r| r.response)
        .collect();

    let report = analyze(subject, &texts)?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human => {
            if cli.quiet {
                println!("{:.1}/10 {}", report.score, report.grade.label());
            } else {
                print!("{}", report.render());
            }
        }
    }

    Ok(())
}
