pub mod radiology;
pub mod run;
pub mod schema;

use clap::{Parser, Subcommand, ValueEnum};
use medsum::config::Provider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medsum")]
#[command(
    author,
    version,
    about = "Parallel clinical record summarizer for Claude Code and Codex CLI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every analysis and the combined clinical summary
    Run(RunArgs),

    /// Run the workflow and report only the imaging analysis
    Radiology(RunArgs),

    /// Print JSON Schema for the config, input bundle or result
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Path to the input bundle (JSON)
    #[arg(short, long)]
    pub bundle: PathBuf,

    /// Path to config file (defaults to medsum.yaml when present)
    #[arg(short, long, env = "MEDSUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override max analyses in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override the per-call completion timeout
    #[arg(long)]
    pub timeout_sec: Option<u64>,

    /// Override provider (claude_cli, codex_cli, fixture)
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Directory of canned responses for the fixture provider
    #[arg(long)]
    pub fixture_dir: Option<PathBuf>,

    /// Write summary.json and summary.md here
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Which schema to print
    #[arg(value_enum, default_value = "config")]
    pub target: SchemaTarget,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaTarget {
    Config,
    Bundle,
    Result,
}
