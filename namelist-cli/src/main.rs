//! namelist CLI - customer listing server
//!
//! Entry point for the `namelist` binary:
//! - `serve`: resolve the store connection, open the pool, serve HTTP
//! - `config`: print the resolved connection (password redacted)
//!
//! Environment variables are read once at startup; `./.env` is loaded first.

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "namelist",
    author,
    version,
    about = "Paginated customer listing served over HTTP",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the connection pool and serve `/` and `/healthz`
    Serve(commands::serve::ServeArgs),
    /// Print the resolved connection descriptor (password redacted)
    Config(commands::config::ConfigArgs),
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Must precede argument parsing so clap's env fallbacks see .env values
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Config(args) => commands::run_config(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
