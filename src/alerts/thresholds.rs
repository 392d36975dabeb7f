use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::alerts::types::{AlertSeverity, AlertType};
use crate::config::store::{SettingsError, SettingsStore};

pub const ENABLED_ALERTS_KEY: &str = "enabled_alerts";
pub const ALERT_THRESHOLDS_KEY: &str = "alert_thresholds";

/// Per-type threshold as seen by callers and as persisted under `alert_thresholds`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub threshold: f64,
    pub enabled: bool,
    #[serde(rename = "severity")]
    pub base_severity: AlertSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ThresholdLimit {
    threshold: f64,
    base_severity: AlertSeverity,
}

impl ThresholdLimit {
    fn default_for(alert_type: AlertType) -> Self {
        let (threshold, base_severity) = match alert_type {
            AlertType::TemperatureHigh => (25.0, AlertSeverity::Moderate), // °C
            AlertType::TemperatureLow => (0.0, AlertSeverity::Moderate),   // °C
            AlertType::RainHeavy => (2.0, AlertSeverity::High),            // mm
            AlertType::SnowHeavy => (5.0, AlertSeverity::High),            // cm
            AlertType::WindStrong => (20.0, AlertSeverity::High),          // km/h
            AlertType::Storm => (0.0, AlertSeverity::Extreme),             // keyword match, no numeric limit
            AlertType::Fog => (500.0, AlertSeverity::Moderate),            // m visibility
            AlertType::UvHigh => (5.0, AlertSeverity::Moderate),
            AlertType::AirQualityPoor => (50.0, AlertSeverity::High), // AQI
            AlertType::HumidityHigh => (85.0, AlertSeverity::Low),    // %
            AlertType::PressureLow => (980.0, AlertSeverity::Moderate), // hPa
        };
        Self {
            threshold,
            base_severity,
        }
    }
}

/// Threshold and enablement per alert type.
///
/// The enabled set is the single source of truth for whether a type is on;
/// the `enabled` flag on every [`ThresholdConfig`] handed out or persisted is
/// derived from it, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRegistry {
    limits: BTreeMap<AlertType, ThresholdLimit>,
    enabled: BTreeSet<AlertType>,
}

impl Default for ThresholdRegistry {
    fn default() -> Self {
        Self {
            limits: AlertType::all()
                .iter()
                .map(|t| (*t, ThresholdLimit::default_for(*t)))
                .collect(),
            enabled: AlertType::all().iter().copied().collect(),
        }
    }
}

impl ThresholdRegistry {
    pub fn default_config(alert_type: AlertType) -> ThresholdConfig {
        let limit = ThresholdLimit::default_for(alert_type);
        ThresholdConfig {
            threshold: limit.threshold,
            enabled: true,
            base_severity: limit.base_severity,
        }
    }

    /// Build a registry from persisted settings, healing and re-persisting it
    pub fn loaded(settings: &dyn SettingsStore) -> Self {
        let mut registry = Self::default();
        registry.load(settings);
        registry
    }

    /// Replace the in-memory configuration with what `settings` holds.
    ///
    /// Never fails: a missing `enabled_alerts` key enables every type, an
    /// unreadable store falls back to defaults, and unknown type names are
    /// dropped. The merged result is written back immediately.
    pub fn load(&mut self, settings: &dyn SettingsStore) {
        *self = Self::default();

        match settings.load(ENABLED_ALERTS_KEY) {
            Ok(None) => {
                debug!("No persisted enabled alerts, enabling all types");
            }
            Ok(Some(Value::Array(items))) => {
                self.enabled = items
                    .iter()
                    .filter_map(|item| match item.as_str().map(str::parse::<AlertType>) {
                        Some(Ok(alert_type)) => Some(alert_type),
                        _ => {
                            debug!("Ignoring unknown enabled alert entry: {}", item);
                            None
                        }
                    })
                    .collect();
            }
            Ok(Some(other)) => {
                warn!("Malformed {} setting ({}), enabling all types", ENABLED_ALERTS_KEY, other);
            }
            Err(e) => {
                warn!("Failed to load alert settings, using defaults: {}", e);
                self.persist_healed(settings);
                return;
            }
        }

        match settings.load(ALERT_THRESHOLDS_KEY) {
            Ok(None) => {}
            Ok(Some(Value::Object(entries))) => self.merge_thresholds(&entries),
            Ok(Some(other)) => {
                warn!("Malformed {} setting ({}), using default thresholds", ALERT_THRESHOLDS_KEY, other);
            }
            Err(e) => {
                warn!("Failed to load alert thresholds, using defaults: {}", e);
            }
        }

        self.persist_healed(settings);
    }

    fn merge_thresholds(&mut self, entries: &Map<String, Value>) {
        for (name, entry) in entries {
            let Ok(alert_type) = name.parse::<AlertType>() else {
                debug!("Ignoring thresholds for unknown alert type: {}", name);
                continue;
            };
            let Some(limit) = self.limits.get_mut(&alert_type) else {
                continue;
            };

            match entry.get("threshold").and_then(Value::as_f64) {
                Some(threshold) if threshold.is_finite() => limit.threshold = threshold,
                Some(_) | None => {
                    debug!("Keeping default threshold for {}", alert_type);
                }
            }
            if let Some(severity) = entry.get("severity").and_then(Value::as_str) {
                match severity.parse::<AlertSeverity>() {
                    Ok(severity) => limit.base_severity = severity,
                    Err(e) => warn!("Invalid severity for {}: {}", alert_type, e),
                }
            }
        }
    }

    fn persist_healed(&self, settings: &dyn SettingsStore) {
        if let Err(e) = self.save(settings) {
            warn!("Failed to persist alert settings: {}", e);
        }
    }

    pub fn save(&self, settings: &dyn SettingsStore) -> Result<(), SettingsError> {
        let enabled: Vec<&str> = self.enabled.iter().map(AlertType::as_str).collect();
        settings.save(ENABLED_ALERTS_KEY, json!(enabled))?;

        let mut thresholds = Map::new();
        for alert_type in AlertType::all() {
            thresholds.insert(
                alert_type.as_str().to_string(),
                serde_json::to_value(self.get(*alert_type))?,
            );
        }
        settings.save(ALERT_THRESHOLDS_KEY, Value::Object(thresholds))
    }

    pub fn get(&self, alert_type: AlertType) -> ThresholdConfig {
        let limit = self
            .limits
            .get(&alert_type)
            .copied()
            .unwrap_or_else(|| ThresholdLimit::default_for(alert_type));
        ThresholdConfig {
            threshold: limit.threshold,
            enabled: self.is_enabled(alert_type),
            base_severity: limit.base_severity,
        }
    }

    pub fn is_enabled(&self, alert_type: AlertType) -> bool {
        self.enabled.contains(&alert_type)
    }

    pub fn enabled_types(&self) -> Vec<AlertType> {
        self.enabled.iter().copied().collect()
    }

    pub fn all_configs(&self) -> BTreeMap<AlertType, ThresholdConfig> {
        AlertType::all().iter().map(|t| (*t, self.get(*t))).collect()
    }

    /// Set a threshold (and optionally enablement), then persist.
    /// Non-finite thresholds are rejected without touching anything.
    pub fn update(
        &mut self,
        alert_type: AlertType,
        threshold: f64,
        enabled: Option<bool>,
        settings: &dyn SettingsStore,
    ) -> Result<(), SettingsError> {
        if !threshold.is_finite() {
            warn!("Ignoring non-finite threshold {} for {}", threshold, alert_type);
            return Ok(());
        }

        self.limits
            .entry(alert_type)
            .or_insert_with(|| ThresholdLimit::default_for(alert_type))
            .threshold = threshold;
        if let Some(enabled) = enabled {
            self.apply_enabled(alert_type, enabled);
        }
        self.save(settings)
    }

    /// String-keyed variant of [`update`](Self::update); unknown names are a no-op.
    /// Returns whether the name was recognised.
    pub fn update_named(
        &mut self,
        name: &str,
        threshold: f64,
        enabled: Option<bool>,
        settings: &dyn SettingsStore,
    ) -> Result<bool, SettingsError> {
        match name.parse::<AlertType>() {
            Ok(alert_type) => self.update(alert_type, threshold, enabled, settings).map(|_| true),
            Err(e) => {
                debug!("{}", e);
                Ok(false)
            }
        }
    }

    pub fn set_enabled(
        &mut self,
        alert_type: AlertType,
        enabled: bool,
        settings: &dyn SettingsStore,
    ) -> Result<(), SettingsError> {
        self.apply_enabled(alert_type, enabled);
        self.save(settings)
    }

    fn apply_enabled(&mut self, alert_type: AlertType, enabled: bool) {
        if enabled {
            self.enabled.insert(alert_type);
        } else {
            self.enabled.remove(&alert_type);
        }
    }
}
