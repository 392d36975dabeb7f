use anyhow::Result;

use crate::commands::{print_status, restore_service};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn handle_alerts_command(config: &Config, json_output: bool) -> Result<()> {
    let (service, state) = restore_service(config).await?;
    let active = service.active_alerts().await;
    // Expired alerts were pruned on restore; keep the file in step
    state.save(&active)?;

    if json_output {
        println!("{}", active.to_json()?);
    } else {
        println!("{}", active.to_table());
    }
    Ok(())
}

pub async fn handle_ack_command(
    config: &Config,
    id: Option<&str>,
    all: bool,
    json_output: bool,
) -> Result<()> {
    let (service, state) = restore_service(config).await?;

    let message = if all {
        let count = service.acknowledge_all().await;
        format!("Acknowledged {} alert(s)", count)
    } else {
        let id = id.ok_or_else(|| anyhow::anyhow!("An alert id or --all is required"))?;
        if !service.acknowledge(id).await {
            anyhow::bail!("No active alert with id {}", id);
        }
        format!("Acknowledged {}", id)
    };

    state.save(&service.export_active().await)?;
    print_status(json_output, &message)
}
