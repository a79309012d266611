//! netscope daemon - main entry point
//!
//! Serves device version and neighbor queries over HTTP, or answers a
//! single combined neighbor query from the command line.

mod api;
mod config;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use netscope_discovery::to_response;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "netscope")]
#[command(about = "Network device query and neighbor discovery service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netscope.toml")]
    config: PathBuf,

    /// Bind address for the HTTP API
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Discover the neighbors of one device, print them and exit
    #[arg(long, value_name = "DEVICE")]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --query output stays machine readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("netscope v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }

    info!(
        inventory = %config.inventory.path,
        driver = %config.driver.program,
        "Configuration loaded"
    );

    let state = state::AppState::new(config.clone())?;

    if let Some(device) = args.query {
        info!(device = %device, "Running single neighbor query");
        let result = state.service.discover_neighbors_combined(&device).await;
        println!("{}", serde_json::to_string_pretty(&to_response(&result))?);
        state.shutdown().await;
    } else {
        server::run(state, &config.daemon.bind).await?;
    }

    Ok(())
}
