use anyhow::Result;

use crate::alerts::AlertType;
use crate::cli::ThresholdAction;
use crate::commands::{build_service, print_status};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn handle_threshold_action(
    config: &Config,
    action: ThresholdAction,
    json_output: bool,
) -> Result<()> {
    let service = build_service(config).await?;

    match action {
        ThresholdAction::Show => {
            let settings = service.settings().await;
            if json_output {
                println!("{}", settings.to_json()?);
            } else {
                println!("{}", settings.to_table());
            }
            Ok(())
        }
        ThresholdAction::Set { alert_type, value, enabled } => {
            if !service.configure_named(&alert_type, value, enabled).await? {
                anyhow::bail!(
                    "Unknown alert type: {}. Valid types: {}",
                    alert_type,
                    valid_types()
                );
            }
            print_status(json_output, &format!("Threshold updated: {} = {}", alert_type.trim(), value))
        }
        ThresholdAction::Enable { alert_type } => toggle(&service, &alert_type, true, json_output).await,
        ThresholdAction::Disable { alert_type } => toggle(&service, &alert_type, false, json_output).await,
    }
}

async fn toggle(
    service: &crate::alerts::AlertingService,
    name: &str,
    enabled: bool,
    json_output: bool,
) -> Result<()> {
    let alert_type: AlertType = name
        .parse()
        .map_err(|e| anyhow::anyhow!("{}. Valid types: {}", e, valid_types()))?;
    service.toggle(alert_type, enabled).await?;

    let verb = if enabled { "enabled" } else { "disabled" };
    print_status(json_output, &format!("Alert type {} {}", alert_type, verb))
}

fn valid_types() -> String {
    AlertType::all()
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
