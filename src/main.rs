//! ScentScan - perfume bottle identification service
//!
//! Runs the HTTP API by default, or identifies a single local image.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use scentscan::config::{self, AppConfig};
use scentscan::server::{self, types::DetailsResponse, AppState};
use scentscan::{IdentifyOutcome, Pipeline};

/// ScentScan - perfume bottle identification
#[derive(Parser, Debug)]
#[command(name = "scentscan")]
#[command(version, about = "Identify perfume bottles and look up their fragrance notes")]
struct Args {
    /// Configuration file (defaults to config.toml in the config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on, overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run the full pipeline once on a local image and print the result
    Identify {
        /// Image file to identify
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scentscan=info,tower_http=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = config::load_config_or_default(args.config.as_deref())?;
    config.apply_env_overrides();

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => run_server(config, bind).await,
        Command::Identify { image } => run_identify(&config, &image).await,
    }
}

/// Serve the HTTP API until the process is stopped
async fn run_server(mut config: AppConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_addr = bind;
    }

    info!("ScentScan {} starting...", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(&config)?;
    server::start_server(&config.server.bind_addr, state)
        .await
        .with_context(|| format!("API server on {} failed", config.server.bind_addr))?;

    info!("ScentScan shutdown complete");
    Ok(())
}

/// Identify one image file and print the details payload
async fn run_identify(config: &AppConfig, image_path: &Path) -> Result<()> {
    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read image {:?}", image_path))?;

    let pipeline = Pipeline::from_config(config)?;

    match pipeline.identify(&image).await? {
        IdentifyOutcome::NoDetections => {
            println!("No perfume bottles detected");
        }
        IdentifyOutcome::Identified(result) => {
            let output = json!({
                "detected_labels": &result.detected_labels,
                "details": DetailsResponse::from(&result),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
