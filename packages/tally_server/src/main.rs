use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use tally_server::AppState;
use tally_server::config::{CliOverrides, ServerConfig};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Live collaborative voting session server")]
struct Args {
    /// Port for the HTTP server (overrides config; 0 = auto-select)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long, default_value = "tally.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let default_directive = if args.debug {
        "tally=debug,tally_server=debug,tally_session=debug,tower_http=debug,info"
    } else {
        "tally=info,tally_server=info,tally_session=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let overrides = CliOverrides {
        host: args.host,
        port: args.port,
    };
    let config = ServerConfig::load(&args.config, &overrides)?;
    info!(
        "Server config: bind={}, send_channel_capacity={}",
        config.bind_addr, config.send_channel_capacity
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tally_server::serve(listener, AppState::new(config), shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, exiting gracefully"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
