use crate::cli::run::prepare;
use crate::cli::RunArgs;
use medsum::bundle::InputBundle;
use tracing::info;

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let (session, _config) = prepare(&args)?;
    let bundle = InputBundle::load(&args.bundle)?;

    match session.query_radiology(bundle).await? {
        Some(_) => info!("Radiology analysis delivered"),
        None => info!("No imaging reports in bundle"),
    }
    Ok(())
}
