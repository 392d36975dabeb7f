use tabled::{Table, Tabled};
use serde::Serialize;
use crate::alerts::{AlertSettings, ThresholdConfig, WeatherAlert};
use crate::alerts::text::format_measure;

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

/// Row for the active alerts table
#[derive(Tabled, Serialize, Debug)]
pub struct AlertRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub alert_type: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Expires")]
    pub expires: String,
}

/// Row for the thresholds table
#[derive(Tabled, Serialize, Debug)]
pub struct ThresholdRow {
    #[tabled(rename = "Alert Type")]
    pub alert_type: String,
    #[tabled(rename = "Enabled")]
    pub enabled: String,
    #[tabled(rename = "Threshold")]
    pub threshold: String,
    #[tabled(rename = "Base Severity")]
    pub severity: String,
}

impl AlertRow {
    pub fn from_alert(alert: &WeatherAlert) -> Self {
        Self {
            id: alert.id.clone(),
            alert_type: alert.alert_type.to_string(),
            severity: alert.severity.to_string(),
            title: alert.title.clone(),
            value: format_value(alert.value, alert.threshold, alert.unit.as_deref()),
            expires: alert.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

impl ThresholdRow {
    pub fn from_config(alert_type: &str, config: &ThresholdConfig, unit: &str) -> Self {
        let threshold = if unit.is_empty() {
            "-".to_string()
        } else {
            format!("{} {}", format_measure(config.threshold), unit)
        };
        Self {
            alert_type: alert_type.to_string(),
            enabled: if config.enabled { "yes" } else { "no" }.to_string(),
            threshold,
            severity: config.base_severity.to_string(),
        }
    }
}

impl OutputFormat for Vec<WeatherAlert> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No active alerts.".to_string();
        }

        let rows: Vec<AlertRow> = self.iter()
            .map(AlertRow::from_alert)
            .collect();

        Table::new(rows).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for AlertSettings {
    fn to_table(&self) -> String {
        let rows: Vec<ThresholdRow> = self.thresholds.iter()
            .map(|(alert_type, config)| ThresholdRow::from_config(alert_type.as_str(), config, alert_type.unit()))
            .collect();

        Table::new(rows).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `30 °C (limit 25 °C)`, or `-` when the alert has no measurement
fn format_value(value: Option<f64>, threshold: Option<f64>, unit: Option<&str>) -> String {
    let unit = unit.unwrap_or("");
    let with_unit = |v: f64| {
        if unit.is_empty() {
            format_measure(v)
        } else {
            format!("{} {}", format_measure(v), unit)
        }
    };

    match (value, threshold) {
        (Some(value), Some(threshold)) => format!("{} (limit {})", with_unit(value), with_unit(threshold)),
        (Some(value), None) => with_unit(value),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertSeverity, AlertType, ThresholdRegistry};
    use chrono::{Duration, TimeZone, Utc};

    fn sample_alert() -> WeatherAlert {
        WeatherAlert::new(
            AlertType::WindStrong,
            AlertSeverity::Extreme,
            "Strong Wind Alert".to_string(),
            "Wind speeds of 65 km/h".to_string(),
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
            Duration::hours(6),
        )
        .with_measurement(65.0, 20.0, "km/h")
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(30.0), Some(25.0), Some("°C")), "30 °C (limit 25 °C)");
        assert_eq!(format_value(Some(7.5), None, Some("UV")), "7.5 UV");
        assert_eq!(format_value(None, None, None), "-");
    }

    #[test]
    fn test_alert_row_creation() {
        let row = AlertRow::from_alert(&sample_alert());
        assert_eq!(row.alert_type, "wind_strong");
        assert_eq!(row.severity, "extreme");
        assert_eq!(row.value, "65 km/h (limit 20 km/h)");
        assert_eq!(row.expires, "2024-05-02 16:00 UTC");
    }

    #[test]
    fn test_empty_alerts_table() {
        let empty: Vec<WeatherAlert> = vec![];
        assert_eq!(empty.to_table(), "No active alerts.");
    }

    #[test]
    fn test_alerts_json_output() {
        let json = vec![sample_alert()].to_json().unwrap();
        assert!(json.contains("\"type\": \"wind_strong\""));
        assert!(json.contains("2024-05-02T16:00:00Z"));
    }

    #[test]
    fn test_threshold_table_lists_every_type() {
        let registry = ThresholdRegistry::default();
        let settings = AlertSettings {
            enabled_types: registry.enabled_types(),
            thresholds: registry.all_configs(),
        };

        let table = settings.to_table();
        for alert_type in AlertType::all() {
            assert!(table.contains(alert_type.as_str()));
        }
    }

    #[test]
    fn test_storm_threshold_row_has_no_number() {
        let config = ThresholdRegistry::default().get(AlertType::Storm);
        let row = ThresholdRow::from_config("storm", &config, AlertType::Storm.unit());
        assert_eq!(row.threshold, "-");
        assert_eq!(row.severity, "extreme");
    }
}
