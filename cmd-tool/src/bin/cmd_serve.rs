use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cmd_tool::server::{serve, AppState};
use cmd_tool::ConfigStorage;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP proxy for catalog, isochrone and finder chart requests")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind_address: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Directory with `{age}_z{Z}.json` track files (overrides config)
    #[arg(long)]
    isochrone_dir: Option<PathBuf>,

    /// Configuration directory (defaults to ~/.cmd_config)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let storage = match args.config_dir {
        Some(dir) => ConfigStorage::with_path(dir),
        None => ConfigStorage::new().context("Cannot locate config directory")?,
    };
    let mut upstream = storage.load_or_default().services.upstream;
    if let Some(dir) = args.isochrone_dir {
        upstream.isochrone_dir = dir;
    }

    if !upstream.isochrone_dir.is_dir() {
        warn!(
            "Isochrone directory {} does not exist; every track request will 404",
            upstream.isochrone_dir.display()
        );
    }
    info!("Catalog: {} via {}", upstream.catalog, upstream.vizier_url);

    serve(Arc::new(AppState::new(upstream)), &args.bind_address, args.port).await
}
