//! HTTP server command
//!
//! Startup order is fixed: resolve the connection, open the pool, then bind
//! the listener. Any failure before the listener starts ends the process.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use namelist_server::{run_server, PoolSettings, ServerConfig, StorePool};

use super::ConnectionArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Address to bind to
    #[arg(long, short = 'b', default_value = "0.0.0.0:4080")]
    pub bind: SocketAddr,

    /// Maximum pooled connections
    #[arg(long, default_value_t = 10)]
    pub max_connections: u32,

    /// Fail at startup if the store cannot be reached
    #[arg(long)]
    pub verify_connection: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let descriptor = args
        .connection
        .resolve()
        .context("Failed to resolve store connection")?;

    let settings = PoolSettings {
        max_connections: args.max_connections,
        verify_on_open: args.verify_connection,
        ..PoolSettings::default()
    };

    let pool = StorePool::open(&descriptor, settings)
        .await
        .context("Failed to open connection pool")?;

    tracing::info!("Starting namelist server on {}", args.bind);
    let config = ServerConfig {
        bind_addr: args.bind,
    };

    // Run server (blocks until shutdown)
    run_server(pool, config).await.context("Server error")?;

    Ok(())
}
