use anyhow::Result;
use std::path::Path;

use crate::cli::ConfigAction;
use crate::commands::print_status;
use crate::config::Config;

pub fn handle_config_action(config_path: &Path, action: ConfigAction, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::default().save_to(config_path)?;
            print_status(
                json_output,
                &format!("Configuration initialized at: {}", config_path.display()),
            )
        }
        ConfigAction::Show => {
            let config = Config::load_from(config_path)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Configuration ({})", config_path.display());
                println!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set_value(&key, &value)?;
            config.save_to(config_path)?;
            print_status(json_output, &format!("Configuration updated: {} = {}", key, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        handle_config_action(
            &path,
            ConfigAction::Set {
                key: "lifecycle.storm_ttl_hours".to_string(),
                value: "18".to_string(),
            },
            true,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.lifecycle.storm_ttl_hours, 18);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let result = handle_config_action(
            &path,
            ConfigAction::Set {
                key: "lifecycle.forecast_hours".to_string(),
                value: "48".to_string(),
            },
            false,
        );
        assert!(result.is_err());
    }
}
