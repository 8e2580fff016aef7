//! Color-magnitude diagram workbench.
//!
//! Subcommands:
//! - `run`: fetch a field, overlay an isochrone, write CSV and/or a plot
//! - `shell`: interactive line commands against one session
//! - `config`: show, initialize or reset the stored defaults

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmd_core::{AgeKey, CatalogQuery, IsochroneParams};
use cmd_tool::shell::{self, ShellCommand};
use cmd_tool::{ConfigStorage, PlotOptions, Services, ToolConfig, Workbench};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cmd_tool")]
#[command(about = "Gaia color-magnitude diagrams with isochrone matching")]
#[command(version)]
struct Args {
    /// Configuration directory (defaults to ~/.cmd_config)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Reach services through this proxy server instead of directly
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one field and produce outputs
    Run {
        /// Right ascension in degrees
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,

        /// Declination in degrees
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,

        /// Search radius in degrees
        #[arg(long, default_value = "0.2")]
        radius: f64,

        /// Isochrone age key (e.g. parsec_9.0); config default if omitted
        #[arg(long)]
        age: Option<String>,

        /// Metallicity Z
        #[arg(long)]
        z: Option<f64>,

        /// Distance modulus added to model magnitudes
        #[arg(long, allow_hyphen_values = true)]
        distance_modulus: Option<f64>,

        /// Matching tolerance in both axes
        #[arg(long)]
        tolerance: Option<f64>,

        /// Write the star table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Render the CMD (PNG for .png, SVG otherwise)
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Plot matched stars only
        #[arg(long)]
        matched_only: bool,
    },

    /// Interactive session
    Shell,

    /// Manage stored defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the defaults to the config file
    Init,
    /// Delete the config file
    Reset,
}

fn storage(args: &Args) -> Result<ConfigStorage> {
    match &args.config_dir {
        Some(dir) => Ok(ConfigStorage::with_path(dir.clone())),
        None => ConfigStorage::new().context("Cannot locate config directory"),
    }
}

/// Build a workbench, validating the isochrone selection first.
fn workbench(config: &ToolConfig) -> Result<Workbench<Services>> {
    let iso = &config.isochrone;
    let selection = IsochroneParams::new(
        iso.age_key.clone(),
        iso.metallicity,
        iso.distance_modulus,
        iso.tolerance,
    )?;
    let frame = config.plot.frame();
    frame.validate()?;
    Ok(Workbench::new(
        Services::from_config(&config.services),
        frame,
        selection,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    mut config: ToolConfig,
    query: CatalogQuery,
    age: Option<String>,
    z: Option<f64>,
    distance_modulus: Option<f64>,
    tolerance: Option<f64>,
    csv: Option<PathBuf>,
    plot: Option<PathBuf>,
    matched_only: bool,
) -> Result<()> {
    let iso = &mut config.isochrone;
    if let Some(age) = age {
        iso.age_key = AgeKey::new(age);
    }
    iso.metallicity = z.unwrap_or(iso.metallicity);
    iso.distance_modulus = distance_modulus.unwrap_or(iso.distance_modulus);
    iso.tolerance = tolerance.unwrap_or(iso.tolerance);

    let mut bench = workbench(&config)?;
    let fetched = bench.fetch_catalog(query).await;
    println!("{}", bench.status());

    match fetched {
        Ok(_) => {}
        Err(e) if e.is_empty_result() => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    if let Some(path) = csv {
        bench.export_csv(&path)?;
        println!("{}", bench.status());
    }
    if let Some(path) = plot {
        bench.render_plot(&path, PlotOptions { matched_only })?;
        println!("Plot written to {}", path.display());
    }
    Ok(())
}

async fn cmd_shell(config: ToolConfig) -> Result<()> {
    let mut bench = workbench(&config)?;
    println!("{}", bench.status());
    println!("{}", shell::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ShellCommand::parse(&line) {
            Ok(Some(command)) => {
                if !shell::execute(&mut bench, command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                bench.report(&e);
                println!("{}", bench.status());
            }
        }
    }
    Ok(())
}

fn cmd_config(storage: &ConfigStorage, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = storage.load_or_default();
            println!("# {}", storage.config_path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            let path = storage.save_config(&storage.load_or_default())?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Reset => {
            if storage.delete_config()? {
                println!("Removed {}", storage.config_path().display());
            } else {
                println!("No config at {}", storage.config_path().display());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let storage = storage(&args)?;
    let mut config = storage.load_or_default();
    if let Some(url) = &args.server {
        config.services.server_url = Some(url.clone());
    }
    info!("Config: {}", storage.config_path().display());

    match args.command {
        Command::Run {
            ra,
            dec,
            radius,
            age,
            z,
            distance_modulus,
            tolerance,
            csv,
            plot,
            matched_only,
        } => {
            let query = CatalogQuery::new(ra, dec, radius)?;
            cmd_run(
                config,
                query,
                age,
                z,
                distance_modulus,
                tolerance,
                csv,
                plot,
                matched_only,
            )
            .await
        }
        Command::Shell => cmd_shell(config).await,
        Command::Config { action } => cmd_config(&storage, action),
    }
}
