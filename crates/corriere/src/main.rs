//! Corriere - fetches timetable and exam snapshots from the group API.
//!
//! Downloaded JSON lands in the data directory, where `orario` picks it up.

mod config;
mod fetcher;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::ApiConfig;
use fetcher::{Fetcher, Snapshot};

#[derive(Parser)]
#[command(name = "corriere")]
#[command(about = "Fetch timetable and exam snapshots from the group API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download snapshots into the data directory
    Fetch {
        /// Only fetch this snapshot
        #[arg(long, value_enum)]
        only: Option<Snapshot>,

        /// Download and validate, but don't write anything
        #[arg(long)]
        dry_run: bool,

        /// Output directory for snapshot files
        /// Default: ./data
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            only,
            dry_run,
            output,
        } => {
            fetch_command(only, dry_run, output).await?;
        }
    }

    Ok(())
}

async fn fetch_command(only: Option<Snapshot>, dry_run: bool, output: Option<PathBuf>) -> Result<()> {
    let config = ApiConfig::from_env().context("Failed to load configuration")?;
    info!("API: {}", config.base_url);

    let output_dir = output.unwrap_or_else(|| PathBuf::from("data"));
    if !dry_run && !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    }

    let fetcher = Fetcher::new(config)?;
    let snapshots: Vec<Snapshot> = match only {
        Some(snapshot) => vec![snapshot],
        None => Snapshot::ALL.to_vec(),
    };

    for snapshot in snapshots {
        let body = match fetcher.fetch(snapshot).await {
            Ok(body) => body,
            Err(e) => {
                error!("Fetch failed: {:#}", e);
                return Err(e);
            }
        };

        if dry_run {
            info!("Dry run, not writing {}", snapshot.file_name());
            continue;
        }

        let path = fetcher::write_snapshot(&output_dir, snapshot, &body)?;
        info!("Saved {:?}", path);
    }

    Ok(())
}
