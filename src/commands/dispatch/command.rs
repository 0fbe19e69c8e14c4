//! Command trait and context for dispatching commands

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::{Cli, Commands};
use crate::commands;
use tonebench_core::config::{ResolvedPaths, TonebenchConfig};
use tonebench_core::error::Result;
use tonebench_core::inputs::load_prompts;
use tonebench_core::store::ResultStore;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: TonebenchConfig,
    pub paths: ResolvedPaths,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: TonebenchConfig, base: &Path, start: Instant) -> Self {
        let paths = config.resolve(base);
        Self {
            cli,
            config,
            paths,
            start,
        }
    }

    pub fn store(&self) -> ResultStore {
        ResultStore::new(&self.paths.results_dir)
    }

    pub fn load_prompts(&self) -> Result<Vec<String>> {
        load_prompts(&self.paths.prompts, &self.config.paths.prompt_column)
    }

    /// Install a Ctrl-C handler that raises the returned flag
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let interrupted_clone = Arc::clone(&interrupted);

        let _ = ctrlc::set_handler(move || {
            interrupted_clone.store(true, Ordering::SeqCst);
        });

        interrupted
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Evaluate {
                subject,
                retry_failed,
            } => commands::evaluate::execute(ctx, subject, *retry_failed),
            Commands::Failures { subject } => commands::failures::execute(ctx, subject.as_deref()),
            Commands::Merge => commands::merge::execute(ctx),
            Commands::Diversity { subject, responses } => {
                commands::diversity::execute(ctx, subject, responses.as_deref())
            }
            Commands::Gather {
                subject,
                provider,
                model,
                system_prompt,
                resume,
            } => commands::gather::execute(
                ctx,
                commands::gather::GatherArgs {
                    subject,
                    provider: *provider,
                    model,
                    system_prompt: system_prompt.as_deref(),
                    resume: *resume,
                },
            ),
            Commands::Subjects => commands::subjects::execute(ctx),
        }
    }
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("tonebench {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Rubric-based LLM-as-judge evaluation for chatbot tone.");
        println!();
        println!("Run `tonebench --help` for usage information.");
        Ok(())
    }
}
