//! CLI argument parsing for tonebench
//!
//! Global flags: --config, --root, --format, --quiet, --verbose,
//! --log-level, --log-json

pub mod parse;
pub mod paths;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use parse::{parse_output_format, parse_provider_kind};
use tonebench_core::format::OutputFormat;
use tonebench_core::provider::ProviderKind;

/// Tonebench - compare chatbot tone with an LLM judge
#[derive(Parser, Debug)]
#[command(name = "tonebench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: <root>/tonebench.toml)
    #[arg(long, global = true, env = "TONEBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base directory for relative input and output paths
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output format (human or json)
    #[arg(long, global = true, default_value = "human", value_parser = parse_output_format)]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Verbose logging (debug level)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. "info", "tonebench_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Judge a subject's responses against the rubric
    Evaluate {
        /// Subject (chatbot configuration) name
        subject: String,

        /// Only re-judge items that are missing or failed
        #[arg(long)]
        retry_failed: bool,
    },

    /// Report results that need to be re-judged
    Failures {
        /// Limit the scan to one subject
        #[arg(long, short)]
        subject: Option<String>,
    },

    /// Merge saved results into a CSV table and a summary report
    Merge,

    /// Analyze how varied a subject's response openings are
    Diversity {
        /// Subject name
        subject: String,

        /// Responses file to analyze instead of the subject's configured one
        #[arg(long)]
        responses: Option<PathBuf>,
    },

    /// Generate a subject's responses for every prompt
    Gather {
        /// Subject name (new names are allowed)
        subject: String,

        /// Provider to call (default: the judge provider from config)
        #[arg(long, value_parser = parse_provider_kind)]
        provider: Option<ProviderKind>,

        /// Model or deployment name
        #[arg(long, short)]
        model: String,

        /// File holding the system prompt
        #[arg(long, short = 's')]
        system_prompt: Option<PathBuf>,

        /// Continue an existing responses file instead of starting over
        #[arg(long)]
        resume: bool,
    },

    /// List configured subjects and their responses files
    Subjects,
}
