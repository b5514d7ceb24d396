mod commands;

use chart_export::AppConfig;
use clap::Parser;
use commands::{execute_command, Commands};
use std::path::PathBuf;

/// Music chart and tracklist exporter
#[derive(Parser)]
#[command(
    name = "chart-export",
    about = "Scrape music charts and tracklists into CSV exports",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to <config dir>/chart-export/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit status events as JSON on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    log::debug!("Using configuration: {config:?}");

    if let Err(e) = execute_command(args.command, config, args.json).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
