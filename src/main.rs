use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the event stream
    let filter = if cli.verbose {
        EnvFilter::new("medsum=debug")
    } else {
        EnvFilter::new("medsum=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Radiology(args) => cli::radiology::execute(args).await,
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
