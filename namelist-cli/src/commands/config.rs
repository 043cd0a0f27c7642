//! Show the resolved connection

use anyhow::{Context, Result};
use clap::Parser;

use super::ConnectionArgs;

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print the redacted connection string instead of JSON
    #[arg(long)]
    pub url: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    let descriptor = args
        .connection
        .resolve()
        .context("Failed to resolve store connection")?;

    if args.url {
        println!("{}", descriptor);
    } else {
        let json = serde_json::to_string_pretty(&descriptor.summary())
            .context("Failed to serialize connection summary")?;
        println!("{}", json);
    }

    Ok(())
}
