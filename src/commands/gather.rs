//! `tonebench gather` command - generate a subject's responses
//!
//! Calls the chosen provider once per prompt and writes
//! `{query, response}` lines to the subject's responses file. With
//! `--resume` an existing file is continued rather than replaced.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::commands::dispatch::CommandContext;
use tonebench_core::error::{Result, TonebenchError};
use tonebench_core::format::{truncate_chars, OutputFormat};
use tonebench_core::gather::{gather, GatherOptions};
use tonebench_core::provider::ProviderKind;

pub struct GatherArgs<'a> {
    pub subject: &'a str,
    /// Falls back to the configured judge provider
    pub provider: Option<ProviderKind>,
    pub model: &'a str,
    pub system_prompt: Option<&'a Path>,
    pub resume: bool,
}

/// Execute the gather command
pub fn execute(ctx: &CommandContext, args: GatherArgs<'_>) -> Result<()> {
    let cli = ctx.cli;
    if args.model.trim().is_empty() {
        tonebench_core::bail_usage!("--model must not be empty");
    }
    let kind = args.provider.unwrap_or(ctx.config.judge.provider);

    let provider = kind.build_from_env(&ctx.config.provider_settings())?;

    let system_prompt = match args.system_prompt {
        Some(path) => {
            let path = ctx.paths.root.join(path);
            if !path.is_file() {
                tonebench_core::bail_missing_input!("system prompt file", path);
            }
            let text = fs::read_to_string(&path)
                .map_err(|e| TonebenchError::io_operation("read", path.display(), e))?;
            Some(text)
        }
        None => None,
    };

    let prompts = ctx.load_prompts()?;
    let output = ctx.config.responses_path(&ctx.paths.root, args.subject);
    debug!(elapsed = ?ctx.start.elapsed(), prompts = prompts.len(), output = %output.display(), "load_inputs");

    let options = GatherOptions {
        system_prompt,
        resume: args.resume,
        ..GatherOptions::new(args.model)
    };

    let human = cli.format == OutputFormat::Human && !cli.quiet;
    if human {
        println!(
            "Gathering {} responses for {} with {} ({})",
            prompts.len(),
            args.subject,
            kind,
            args.model
        );
    }

    let interrupt = ctx.interrupt_flag();
    let summary = gather(
        args.subject,
        &prompts,
        &provider,
        &options,
        &output,
        Some(&*interrupt),
        |position, total, query| {
            if human {
                println!("[{}/{}] {}", position, total, truncate_chars(query, 60));
            }
        },
    )?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!();
                println!(
                    "{}: {} generated, {} resumed, {} errors",
                    summary.subject, summary.generated, summary.resumed, summary.errors
                );
                println!("Responses saved to {}", summary.output.display());
            }
        }
    }

    if summary.interrupted {
        return Err(TonebenchError::Interrupted);
    }
    Ok(())
}
