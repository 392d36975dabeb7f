// weather-alerts: threshold-based weather alerting
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use weather_alerts::cli::{Cli, Commands};
use weather_alerts::commands::{
    handle_ack_command, handle_alerts_command, handle_check_command, handle_config_action,
    handle_threshold_action,
};
use weather_alerts::config::{Config, expand_home};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => expand_home(path)?,
        None => Config::default_path()?,
    };

    match cli.command {
        // Must work even when the file on disk is broken
        Commands::Config { action } => {
            init_tracing(cli.verbose, "info");
            handle_config_action(&config_path, action, cli.json)
        }
        Commands::Check { snapshot, forecast } => {
            let config = load_config(&config_path, cli.verbose)?;
            handle_check_command(&config, &snapshot, forecast.as_deref(), cli.json).await
        }
        Commands::Alerts => {
            let config = load_config(&config_path, cli.verbose)?;
            handle_alerts_command(&config, cli.json).await
        }
        Commands::Ack { id, all } => {
            let config = load_config(&config_path, cli.verbose)?;
            handle_ack_command(&config, id.as_deref(), all, cli.json).await
        }
        Commands::Thresholds { action } => {
            let config = load_config(&config_path, cli.verbose)?;
            handle_threshold_action(&config, action, cli.json).await
        }
    }
}

fn load_config(config_path: &Path, verbose: bool) -> anyhow::Result<Config> {
    let config = Config::load_from(config_path)?;
    init_tracing(verbose, &config.logging.level);
    tracing::debug!("Using configuration at {}", config_path.display());
    Ok(config)
}

/// RUST_LOG wins, then --verbose, then the configured level
fn init_tracing(verbose: bool, configured_level: &str) {
    let default_level = if verbose { "debug" } else { configured_level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_alerts={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
