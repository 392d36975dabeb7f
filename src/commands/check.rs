use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::commands::restore_service;
use crate::config::{Config, expand_home};
use crate::output::OutputFormat;
use crate::weather::{ForecastEntry, WeatherSnapshot};

pub async fn handle_check_command(
    config: &Config,
    snapshot_path: &str,
    forecast_path: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let snapshot = WeatherSnapshot::from_json(&read_json(&expand_home(snapshot_path)?)?);
    let forecast = match forecast_path {
        Some(path) => Some(ForecastEntry::list_from_json(&read_json(&expand_home(path)?)?)),
        None => None,
    };

    let (service, state) = restore_service(config).await?;
    let admitted = service
        .check_conditions(&snapshot, forecast.as_deref())
        .await;
    info!("Check raised {} new alert(s)", admitted.len());

    state.save(&service.export_active().await)?;

    if json_output {
        println!("{}", admitted.to_json()?);
    } else if admitted.is_empty() {
        println!("No new alerts.");
    } else {
        println!("{}", admitted.to_table());
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))
}
