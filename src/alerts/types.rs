use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of weather conditions the engine can raise alerts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    TemperatureHigh,
    TemperatureLow,
    RainHeavy,
    SnowHeavy,
    WindStrong,
    Storm,
    Fog,
    UvHigh,
    AirQualityPoor,
    HumidityHigh,
    PressureLow,
}

impl AlertType {
    pub const ALL: [AlertType; 11] = [
        AlertType::TemperatureHigh,
        AlertType::TemperatureLow,
        AlertType::RainHeavy,
        AlertType::SnowHeavy,
        AlertType::WindStrong,
        AlertType::Storm,
        AlertType::Fog,
        AlertType::UvHigh,
        AlertType::AirQualityPoor,
        AlertType::HumidityHigh,
        AlertType::PressureLow,
    ];

    pub fn all() -> &'static [AlertType] {
        &Self::ALL
    }

    /// Stable identifier used in persisted settings and translation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::TemperatureHigh => "temperature_high",
            AlertType::TemperatureLow => "temperature_low",
            AlertType::RainHeavy => "rain_heavy",
            AlertType::SnowHeavy => "snow_heavy",
            AlertType::WindStrong => "wind_strong",
            AlertType::Storm => "storm",
            AlertType::Fog => "fog",
            AlertType::UvHigh => "uv_high",
            AlertType::AirQualityPoor => "air_quality_poor",
            AlertType::HumidityHigh => "humidity_high",
            AlertType::PressureLow => "pressure_low",
        }
    }

    /// Unit of the measured quantity recorded on alerts of this type
    pub fn unit(&self) -> &'static str {
        match self {
            AlertType::TemperatureHigh | AlertType::TemperatureLow => "°C",
            AlertType::RainHeavy => "mm",
            AlertType::SnowHeavy => "cm",
            AlertType::WindStrong => "km/h",
            AlertType::Storm => "",
            AlertType::Fog => "m",
            AlertType::UvHigh => "UV",
            AlertType::AirQualityPoor => "AQI",
            AlertType::HumidityHigh => "%",
            AlertType::PressureLow => "hPa",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown alert type: {0}")]
pub struct ParseAlertTypeError(pub String);

impl FromStr for AlertType {
    type Err = ParseAlertTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AlertType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| ParseAlertTypeError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Moderate,
    High,
    Extreme,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::High => "high",
            AlertSeverity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(AlertSeverity::Low),
            "moderate" => Ok(AlertSeverity::Moderate),
            "high" => Ok(AlertSeverity::High),
            "extreme" => Ok(AlertSeverity::Extreme),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// A classified weather alert.
///
/// Severity, threshold and measured value are captured when the alert is
/// created and are never rewritten afterwards. The only mutation an alert
/// sees is acknowledgement, which is one-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl WeatherAlert {
    pub fn new(
        alert_type: AlertType,
        severity: AlertSeverity,
        title: String,
        message: String,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Self::make_id(alert_type, created_at),
            alert_type,
            severity,
            title,
            message,
            value: None,
            threshold: None,
            unit: None,
            created_at,
            // Out-of-range TTLs saturate instead of overflowing
            expires_at: created_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            acknowledged: false,
        }
    }

    pub fn with_measurement(mut self, value: f64, threshold: f64, unit: &str) -> Self {
        self.value = Some(value);
        self.threshold = Some(threshold);
        self.unit = Some(unit.to_string());
        self
    }

    /// `{type}_{creation millis}`: two alerts of one type created in the same
    /// millisecond share an id, so the store refuses the second one.
    pub fn make_id(alert_type: AlertType, created_at: DateTime<Utc>) -> String {
        format!("{}_{}", alert_type.as_str(), created_at.timestamp_millis())
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && !self.acknowledged
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }
}
