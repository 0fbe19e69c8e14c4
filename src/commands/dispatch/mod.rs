//! Command dispatch logic for tonebench

use std::time::Instant;

use crate::cli::paths::{resolve_config, resolve_root_path};
use crate::cli::Cli;
use tonebench_core::config::TonebenchConfig;
use tonebench_core::error::Result;
use tracing::debug;

mod command;

pub use command::CommandContext;
use command::{Command, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let cwd = resolve_root_path(None);
    let (config_path, base) = resolve_config(cli.config.as_deref(), cli.root.as_deref(), &cwd);

    let config = TonebenchConfig::load_or_default(&config_path)?;
    debug!(elapsed = ?start.elapsed(), config = %config_path.display(), "load_config");

    let ctx = CommandContext::new(cli, config, &base, start);

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}
