//! `tonebench evaluate` command - judge one subject's responses
//!
//! - `tonebench evaluate <subject>` - judge everything not already done
//! - `tonebench evaluate <subject> --retry-failed` - re-judge failures only
//!
//! Both forms resume: finished items are never judged twice.

use tracing::{debug, info};

use crate::commands::dispatch::CommandContext;
use tonebench_core::batch::{build_items, BatchRun, BatchSummary, Item, RunMode};
use tonebench_core::error::{Result, TonebenchError};
use tonebench_core::failures::retry_command;
use tonebench_core::format::OutputFormat;
use tonebench_core::inputs::{load_responses, load_rubric};
use tonebench_core::judge::{JudgeAdapter, JudgeOptions};

/// Execute the evaluate command
pub fn execute(ctx: &CommandContext, subject: &str, retry_failed: bool) -> Result<()> {
    let cli = ctx.cli;
    let config = &ctx.config;

    config.subject(subject)?;

    let provider = config
        .judge
        .provider
        .build_from_env(&config.provider_settings())?;

    let prompts = ctx.load_prompts()?;
    let responses = load_responses(&config.responses_path(&ctx.paths.root, subject))?;
    let rubric = load_rubric(&ctx.paths.rubric)?;
    debug!(elapsed = ?ctx.start.elapsed(), prompts = prompts.len(), responses = responses.len(), "load_inputs");

    let texts: Vec<String> = responses.into_iter().map(|r| r.response).collect();
    let items = build_items(&prompts, &texts);

    let options = JudgeOptions {
        model: config.judge_model(),
        temperature: config.judge.temperature,
        max_tokens: config.judge.max_tokens,
    };
    info!(provider = %config.judge.provider, model = %options.model, "judge configured");
    let judge = JudgeAdapter::new(provider, rubric, options);

    let store = ctx.store();
    let mode = if retry_failed {
        RunMode::RetryFailed
    } else {
        RunMode::Full
    };
    let run = BatchRun {
        subject,
        mode,
        judge: &judge,
        store: &store,
        interrupt: Some(ctx.interrupt_flag()),
    };

    let human = cli.format == OutputFormat::Human && !cli.quiet;
    if human {
        let preview = run.preview(&items);
        match mode {
            RunMode::Full => println!(
                "Evaluating {}: {} items, {} already done",
                subject,
                items.len(),
                preview
            ),
            RunMode::RetryFailed => println!(
                "Retrying failed evaluations for {}: {} of {} items",
                subject,
                preview,
                items.len()
            ),
        }
    }

    let mut report_progress = |position: usize, total: usize, item: &Item| {
        if human {
            println!("[{}/{}] Evaluating query {:03}", position, total, item.index);
        }
    };
    let summary = run.run(&items, Some(&mut report_progress))?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "subject": subject,
                "mode": mode.as_str(),
                "results_dir": store.individual_dir().display().to_string(),
                "summary": &summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                print_summary(subject, &summary, &store.individual_dir().display().to_string());
            }
        }
    }

    if summary.interrupted {
        return Err(TonebenchError::Interrupted);
    }
    Ok(())
}

fn print_summary(subject: &str, summary: &BatchSummary, results_dir: &str) {
    println!();
    println!(
        "{}: {} evaluated, {} skipped, {} need retry",
        subject, summary.evaluated, summary.skipped, summary.failed
    );
    println!("Results saved to {}", results_dir);
    if summary.failed > 0 {
        println!("Retry with: {}", retry_command(subject));
    }
}
