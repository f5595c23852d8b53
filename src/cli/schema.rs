use crate::cli::{SchemaArgs, SchemaTarget};
use medsum::bundle::InputBundle;
use medsum::config::Config;
use medsum::workflow::CombinedResult;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.target {
        SchemaTarget::Config => schema_for!(Config),
        SchemaTarget::Bundle => schema_for!(InputBundle),
        SchemaTarget::Result => schema_for!(CombinedResult),
    };
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
