use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::fs;

use crate::alerts::{AlertTtl, LifecyclePolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub lifecycle: LifecycleConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub settings_path: String, // thresholds and enabled alert types (JSON)
    pub state_path: String,    // active alerts between runs (JSON)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub dedup_window_minutes: u32,
    pub default_ttl_hours: u32,
    pub storm_ttl_hours: u32,
    pub forecast_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub display: bool,
    pub listener_timeout_secs: u64, // 0 = wait indefinitely
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            settings_path: "~/.config/weather-alerts/settings.json".to_string(),
            state_path: "~/.config/weather-alerts/active_alerts.json".to_string(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dedup_window_minutes: 60,
            default_ttl_hours: 6,
            storm_ttl_hours: 12,
            forecast_hours: 24,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display: true,
            listener_timeout_secs: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const MAX_FORECAST_HOURS: u32 = 24;
const MAX_TTL_HOURS: u32 = 24 * 366;
const MAX_DEDUP_MINUTES: u32 = 7 * 24 * 60;

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing the defaults there first if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Generate TOML configuration with comments explaining every option
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# weather-alerts Configuration File\n");
        output.push_str("#\n");
        output.push_str("# All settings have defaults; delete this file to regenerate it.\n");
        output.push_str("# Alert thresholds themselves live in the settings file below and are\n");
        output.push_str("# managed with `weather-alerts thresholds ...`.\n");
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# GENERAL SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[general]\n");
        output.push_str("# JSON file holding enabled alert types and per-type thresholds\n");
        output.push_str("# Created with every alert type enabled on first run\n");
        output.push_str(&format!("settings_path = \"{}\"\n", self.general.settings_path));
        output.push_str("\n");
        output.push_str("# JSON file holding alerts that are still active between runs\n");
        output.push_str(&format!("state_path = \"{}\"\n", self.general.state_path));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# ALERT LIFECYCLE\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[lifecycle]\n");
        output.push_str("# Repeat detections of an alert type within this many minutes are suppressed\n");
        output.push_str(&format!("dedup_window_minutes = {}\n", self.lifecycle.dedup_window_minutes));
        output.push_str("\n");
        output.push_str("# Hours until an alert expires on its own\n");
        output.push_str(&format!("default_ttl_hours = {}\n", self.lifecycle.default_ttl_hours));
        output.push_str("\n");
        output.push_str("# Storm warnings stay active longer\n");
        output.push_str(&format!("storm_ttl_hours = {}\n", self.lifecycle.storm_ttl_hours));
        output.push_str("\n");
        output.push_str("# How many hourly forecast entries are scanned for storms and heavy rain\n");
        output.push_str(&format!("forecast_hours = {}\n", self.lifecycle.forecast_hours));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# NOTIFICATIONS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[notifications]\n");
        output.push_str("# Print newly raised alerts to the terminal\n");
        output.push_str(&format!("display = {}\n", self.notifications.display));
        output.push_str("\n");
        output.push_str("# Give up on a listener after this many seconds (0 = wait indefinitely)\n");
        output.push_str(&format!("listener_timeout_secs = {}\n", self.notifications.listener_timeout_secs));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# LOGGING\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[logging]\n");
        output.push_str("# One of: error, warn, info, debug, trace\n");
        output.push_str("# RUST_LOG overrides this; --verbose forces debug\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        Ok(output)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?;
        Ok(config_dir.join("weather-alerts").join("config.toml"))
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        expand_home(&self.general.settings_path)
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        expand_home(&self.general.state_path)
    }

    /// Hand-edited files skip `set_value`, so out-of-range values are clamped here
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        let lifecycle = &self.lifecycle;
        let dedup_minutes = lifecycle.dedup_window_minutes.clamp(1, MAX_DEDUP_MINUTES);
        let ttl_hours = |hours: u32| chrono::Duration::hours(hours.clamp(1, MAX_TTL_HOURS) as i64);

        LifecyclePolicy {
            dedup_window: chrono::Duration::minutes(dedup_minutes as i64),
            ttl: AlertTtl {
                default: ttl_hours(lifecycle.default_ttl_hours),
                storm: ttl_hours(lifecycle.storm_ttl_hours),
            },
            forecast_hours: lifecycle.forecast_hours.min(MAX_FORECAST_HOURS) as usize,
        }
    }

    pub fn listener_timeout(&self) -> Option<std::time::Duration> {
        match self.notifications.listener_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "general.settings_path" => self.general.settings_path = value.to_string(),
            "general.state_path" => self.general.state_path = value.to_string(),
            "lifecycle.dedup_window_minutes" => {
                let minutes: u32 = value.parse()
                    .with_context(|| format!("Invalid minutes value: {}", value))?;
                if minutes == 0 || minutes > MAX_DEDUP_MINUTES {
                    anyhow::bail!("Dedup window must be between 1 and {} minutes", MAX_DEDUP_MINUTES);
                }
                self.lifecycle.dedup_window_minutes = minutes;
            }
            "lifecycle.default_ttl_hours" => {
                self.lifecycle.default_ttl_hours = parse_positive_hours(value)?;
            }
            "lifecycle.storm_ttl_hours" => {
                self.lifecycle.storm_ttl_hours = parse_positive_hours(value)?;
            }
            "lifecycle.forecast_hours" => {
                let hours: u32 = value.parse()
                    .with_context(|| format!("Invalid hour value: {}", value))?;
                if hours > MAX_FORECAST_HOURS {
                    anyhow::bail!("Forecast look-ahead must be between 0 and {} hours", MAX_FORECAST_HOURS);
                }
                self.lifecycle.forecast_hours = hours;
            }
            "notifications.display" => {
                self.notifications.display = value.parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "notifications.listener_timeout_secs" => {
                self.notifications.listener_timeout_secs = value.parse()
                    .with_context(|| format!("Invalid seconds value: {}", value))?;
            }
            "logging.level" => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    anyhow::bail!("Invalid log level: {}. Must be one of {}", value, LOG_LEVELS.join(", "));
                }
                self.logging.level = level;
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}

fn parse_positive_hours(value: &str) -> Result<u32> {
    let hours: u32 = value.parse()
        .with_context(|| format!("Invalid hour value: {}", value))?;
    if hours == 0 || hours > MAX_TTL_HOURS {
        anyhow::bail!("Expiry must be between 1 and {} hours", MAX_TTL_HOURS);
    }
    Ok(hours)
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("weather-alerts").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.lifecycle.dedup_window_minutes, 60);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[lifecycle]"));
        assert!(contents.contains("storm_ttl_hours = 12"));
    }

    #[test]
    fn test_commented_toml_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.set_value("lifecycle.dedup_window_minutes", "30").unwrap();
        config.set_value("notifications.display", "false").unwrap();
        config.set_value("logging.level", "DEBUG").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.lifecycle.dedup_window_minutes, 30);
        assert!(!loaded.notifications.display);
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[lifecycle]\nstorm_ttl_hours = 18\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.lifecycle.storm_ttl_hours, 18);
        assert_eq!(config.lifecycle.default_ttl_hours, 6);
        assert!(config.notifications.display);
    }

    #[test]
    fn test_set_value_validation() {
        let mut config = Config::default();
        assert!(config.set_value("lifecycle.forecast_hours", "48").is_err());
        assert!(config.set_value("lifecycle.default_ttl_hours", "0").is_err());
        assert!(config.set_value("logging.level", "loud").is_err());
        assert!(config.set_value("general.nope", "x").is_err());
        assert!(config.set_value("notifications.display", "maybe").is_err());
        assert!(config.set_value("lifecycle.dedup_window_minutes", "0").is_err());
        assert!(config.set_value("lifecycle.storm_ttl_hours", "4000000000").is_err());
        assert!(config.set_value("lifecycle.default_ttl_hours", "9000").is_err());
        assert!(config.set_value("lifecycle.default_ttl_hours", "48").is_ok());
    }

    #[test]
    fn test_lifecycle_policy_clamps_hand_edited_values() {
        let config: Config = toml::from_str(
            "[lifecycle]\ndedup_window_minutes = 0\ndefault_ttl_hours = 4000000000\nstorm_ttl_hours = 0\nforecast_hours = 48\n",
        )
        .unwrap();

        let policy = config.lifecycle_policy();
        assert_eq!(policy.dedup_window, chrono::Duration::minutes(1));
        assert_eq!(policy.ttl.default, chrono::Duration::hours(MAX_TTL_HOURS as i64));
        assert_eq!(policy.ttl.storm, chrono::Duration::hours(1));
        assert_eq!(policy.forecast_hours, 24);
    }

    #[test]
    fn test_lifecycle_policy_and_timeout() {
        let mut config = Config::default();
        let policy = config.lifecycle_policy();
        assert_eq!(policy.dedup_window, chrono::Duration::hours(1));
        assert_eq!(policy.ttl.storm, chrono::Duration::hours(12));
        assert_eq!(config.listener_timeout(), None);

        config.set_value("notifications.listener_timeout_secs", "5").unwrap();
        assert_eq!(config.listener_timeout(), Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/x.json").unwrap(), PathBuf::from("/tmp/x.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a/b.json").unwrap(), home.join("a/b.json"));
        }
    }
}
