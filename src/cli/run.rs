use crate::cli::RunArgs;
use medsum::bundle::InputBundle;
use medsum::config::Config;
use medsum::output::write_summary;
use medsum::provider::create_port;
use medsum::session::Session;
use medsum::workflow::{Orchestrator, WorkflowDefinition};
use std::io::Stdout;
use std::time::Instant;
use tracing::info;

/// Load config, apply CLI overrides and build a session writing to stdout
pub fn prepare(args: &RunArgs) -> anyhow::Result<(Session<Stdout>, Config)> {
    let mut config = Config::load_or_default(args.config.as_deref())?;

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_sec) = args.timeout_sec {
        config.timeout_sec = timeout_sec;
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(dir) = &args.fixture_dir {
        config.providers.fixture.dir = dir.clone();
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = Some(dir.clone());
    }

    config.validate()?;

    info!(
        "Using provider {} with concurrency {}",
        config.provider, config.concurrency
    );

    let definition = WorkflowDefinition::standard(&config)?;
    info!(
        "Registered {} analyses: {:?}",
        definition.fan_out().len(),
        definition.task_names()
    );
    let orchestrator = Orchestrator::new(definition, create_port(&config), config.concurrency);
    Ok((Session::new(orchestrator, std::io::stdout()), config))
}

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let (session, config) = prepare(&args)?;

    info!("Loading bundle from {:?}", args.bundle);
    let bundle = InputBundle::load(&args.bundle)?;
    info!(
        "Bundle has {} populated record categories",
        bundle.populated_categories()
    );

    let start = Instant::now();
    let result = session.summarize(bundle).await?;

    if let Some(report_dir) = &config.report_dir {
        write_summary(report_dir, &result, &args.bundle, start.elapsed())?;
        info!("Summary written to {:?}", report_dir);
    }

    info!(
        "Completed in {:.1}s: {} analyses produced, data completeness {}",
        start.elapsed().as_secs_f64(),
        result.produced_count(),
        result.clinical_summary.data_completeness
    );

    Ok(())
}
