use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::warn;

use crate::alerts::WeatherAlert;

/// Active alerts persisted between CLI runs as a JSON array
#[derive(Debug, Clone)]
pub struct AlertStateFile {
    path: PathBuf,
}

impl AlertStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state starts empty; stale alerts are only
    /// worth a warning, never a failed run.
    pub fn load(&self) -> Vec<WeatherAlert> {
        if !self.path.exists() {
            return Vec::new();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read alert state {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!("Discarding malformed alert state {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, alerts: &[WeatherAlert]) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(alerts)
            .context("Failed to serialize active alerts")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write alert state: {}", self.path.display()))?;

        Ok(())
    }
}
