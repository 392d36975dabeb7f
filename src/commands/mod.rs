// Command handlers module
pub mod alerts;
pub mod check;
pub mod config;
pub mod thresholds;

use anyhow::Result;
use std::sync::Arc;

use crate::alerts::{AlertingService, BuiltinCatalog, LogListener};
use crate::config::{Config, JsonFileSettings};
use crate::output::ConsoleDisplay;
use crate::storage::AlertStateFile;

// Re-export command handlers for easy access
pub use alerts::{handle_ack_command, handle_alerts_command};
pub use check::handle_check_command;
pub use config::handle_config_action;
pub use thresholds::handle_threshold_action;

/// Wire up the alerting service the way every command sees it: thresholds
/// from the JSON settings file, English text, console display when enabled
/// and the log listener.
pub async fn build_service(config: &Config) -> Result<AlertingService> {
    let settings = Arc::new(JsonFileSettings::new(config.settings_path()?));

    let mut service = AlertingService::new(settings, Arc::new(BuiltinCatalog))
        .with_policy(config.lifecycle_policy())
        .with_listener_timeout(config.listener_timeout());
    if config.notifications.display {
        service = service.with_display(Arc::new(ConsoleDisplay));
    }

    service.register_listener(Arc::new(LogListener)).await;
    Ok(service)
}

/// Service plus the active alerts left over from the previous run
pub async fn restore_service(config: &Config) -> Result<(AlertingService, AlertStateFile)> {
    let service = build_service(config).await?;
    let state = AlertStateFile::new(config.state_path()?);

    let restored = service.restore(state.load()).await;
    tracing::debug!("Restored {} active alert(s) from {}", restored, state.path().display());

    Ok((service, state))
}

/// Print `{"status": ..., "message": ...}` or the bare message
pub(crate) fn print_status(json_output: bool, message: &str) -> Result<()> {
    if json_output {
        let status = serde_json::json!({ "status": "success", "message": message });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", message);
    }
    Ok(())
}
