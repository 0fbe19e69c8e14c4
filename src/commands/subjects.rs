//! `tonebench subjects` command - list configured subjects

use crate::commands::dispatch::CommandContext;
use tonebench_core::error::Result;
use tonebench_core::format::OutputFormat;

/// Execute the subjects command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let cli = ctx.cli;
    let root = &ctx.paths.root;

    let subjects: Vec<(String, std::path::PathBuf)> = ctx
        .config
        .subject_names()
        .into_iter()
        .map(|name| {
            let path = ctx.config.responses_path(root, &name);
            (name, path)
        })
        .collect();

    match cli.format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = subjects
                .iter()
                .map(|(name, path)| {
                    serde_json::json!({
                        "subject": name,
                        "responses": path.display().to_string(),
                        "responses_exists": path.is_file(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            for (name, path) in &subjects {
                if cli.quiet {
                    println!("{}", name);
                } else {
                    let marker = if path.is_file() { "" } else { " (missing)" };
                    println!("{:<20} {}{}", name, path.display(), marker);
                }
            }
        }
    }

    Ok(())
}
