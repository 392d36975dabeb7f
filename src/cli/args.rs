use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weather-alerts")]
#[command(about = "Weather condition alerting engine")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., lifecycle.dedup_window_minutes)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ThresholdAction {
    /// Show thresholds and enabled alert types
    Show,
    /// Set the threshold for an alert type
    Set {
        /// Alert type (e.g., wind_strong)
        alert_type: String,
        /// New threshold value
        value: f64,
        /// Also enable or disable the type
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Enable an alert type
    Enable {
        /// Alert type (e.g., uv_high)
        alert_type: String,
    },
    /// Disable an alert type
    Disable {
        /// Alert type (e.g., uv_high)
        alert_type: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a weather snapshot and raise new alerts
    Check {
        /// Path to the current conditions (JSON object)
        #[arg(long)]
        snapshot: String,

        /// Path to the hourly forecast (JSON array)
        #[arg(long)]
        forecast: Option<String>,
    },

    /// List active alerts
    Alerts,

    /// Acknowledge an alert
    Ack {
        /// Alert id as shown by `alerts`
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Acknowledge every active alert
        #[arg(long)]
        all: bool,
    },

    /// Threshold management
    Thresholds {
        #[command(subcommand)]
        action: ThresholdAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
