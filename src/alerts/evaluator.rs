use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::alerts::severity::{Direction, SeverityClassifier};
use crate::alerts::text::{AlertText, format_measure};
use crate::alerts::thresholds::ThresholdRegistry;
use crate::alerts::types::{AlertSeverity, AlertType, WeatherAlert};
use crate::weather::{ForecastEntry, WeatherSnapshot};

static STORM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)storm|thunder|severe").expect("storm pattern is valid"));

/// Visibility below which the pseudo-AQI path always fires (m)
const POOR_VISIBILITY: f64 = 1000.0;
/// Visibility above which a pseudo-AQI alert stays moderate (m)
const MODERATE_VISIBILITY: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertTtl {
    pub default: Duration,
    pub storm: Duration,
}

impl Default for AlertTtl {
    fn default() -> Self {
        Self {
            default: Duration::hours(6),
            storm: Duration::hours(12),
        }
    }
}

/// Turns a snapshot (and optional hourly forecast) into candidate alerts.
/// Holds no alert state; admission and dedup happen in the store.
#[derive(Clone)]
pub struct ConditionEvaluator {
    text: AlertText,
    ttl: AlertTtl,
    forecast_hours: usize,
}

impl ConditionEvaluator {
    pub fn new(text: AlertText) -> Self {
        Self {
            text,
            ttl: AlertTtl::default(),
            forecast_hours: 24,
        }
    }

    pub fn with_ttl(mut self, ttl: AlertTtl) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_forecast_hours(mut self, hours: usize) -> Self {
        self.forecast_hours = hours;
        self
    }

    pub fn evaluate(
        &self,
        registry: &ThresholdRegistry,
        snapshot: &WeatherSnapshot,
        forecast: Option<&[ForecastEntry]>,
        now: DateTime<Utc>,
    ) -> Vec<WeatherAlert> {
        let mut candidates = Vec::new();

        for alert_type in AlertType::all() {
            if !registry.is_enabled(*alert_type) {
                continue;
            }
            if let Some(alert) = self.check_current(*alert_type, registry, snapshot, now) {
                candidates.push(alert);
            }
        }

        if let Some(forecast) = forecast {
            let horizon = &forecast[..forecast.len().min(self.forecast_hours)];
            if registry.is_enabled(AlertType::Storm) {
                candidates.extend(self.check_storms(horizon, now));
            }
            if registry.is_enabled(AlertType::RainHeavy) {
                candidates.extend(self.check_forecast_rain(registry, horizon, now));
            }
        }

        debug!("Evaluation produced {} candidate alert(s)", candidates.len());
        candidates
    }

    fn check_current(
        &self,
        alert_type: AlertType,
        registry: &ThresholdRegistry,
        snapshot: &WeatherSnapshot,
        now: DateTime<Utc>,
    ) -> Option<WeatherAlert> {
        if alert_type == AlertType::AirQualityPoor {
            return self.check_air_quality(registry, snapshot, now);
        }

        let (reading, direction) = current_reading(alert_type, snapshot)?;
        if reading < 0.0 && !allows_negative(alert_type) {
            debug!("Ignoring out-of-range {} reading {}", alert_type, reading);
            return None;
        }

        let config = registry.get(alert_type);
        let severity = SeverityClassifier::classify(
            alert_type,
            direction,
            reading,
            config.threshold,
            config.base_severity,
        )?;

        let key = match alert_type {
            AlertType::RainHeavy => "rain_heavy.detected".to_string(),
            other => other.as_str().to_string(),
        };
        let unit = alert_type.unit();
        let args = [
            ("value", format_measure(reading)),
            ("threshold", format_measure(config.threshold)),
            ("unit", unit.to_string()),
        ];

        Some(
            self.build(alert_type, severity, &key, &args, now, self.ttl.default)
                .with_measurement(reading, config.threshold, unit),
        )
    }

    /// Direct AQI when the provider has it, otherwise an estimate from visibility
    fn check_air_quality(
        &self,
        registry: &ThresholdRegistry,
        snapshot: &WeatherSnapshot,
        now: DateTime<Utc>,
    ) -> Option<WeatherAlert> {
        let config = registry.get(AlertType::AirQualityPoor);

        if let Some(aqi) = snapshot.aqi() {
            if aqi < 0.0 {
                return None;
            }
            let severity = SeverityClassifier::classify(
                AlertType::AirQualityPoor,
                Direction::Above,
                aqi,
                config.threshold,
                config.base_severity,
            )?;
            let args = [
                ("value", format_measure(aqi)),
                ("threshold", format_measure(config.threshold)),
                ("unit", "AQI".to_string()),
            ];
            return Some(
                self.build(AlertType::AirQualityPoor, severity, "air_quality_poor", &args, now, self.ttl.default)
                    .with_measurement(aqi, config.threshold, "AQI"),
            );
        }

        let visibility = snapshot.visibility.filter(|v| v.is_finite() && *v >= 0.0)?;
        let pseudo_aqi = (200.0 - visibility / 50.0).max(0.0);
        let estimated_poor = SeverityClassifier::crossing(Direction::Above, pseudo_aqi, config.threshold).is_some();
        if !estimated_poor && visibility >= POOR_VISIBILITY {
            return None;
        }

        let severity = if visibility > MODERATE_VISIBILITY {
            AlertSeverity::Moderate
        } else {
            AlertSeverity::High
        };
        let title = self.text.render("air_quality_poor.title", &[]);
        let message = self.text.render(
            "air_quality_poor.visibility.message",
            &[
                ("value", format_measure(visibility)),
                ("unit", "m".to_string()),
                ("aqi", format_measure(pseudo_aqi)),
            ],
        );
        Some(
            WeatherAlert::new(AlertType::AirQualityPoor, severity, title, message, now, self.ttl.default)
                .with_measurement(visibility, POOR_VISIBILITY, "m"),
        )
    }

    fn check_storms(&self, horizon: &[ForecastEntry], now: DateTime<Utc>) -> Vec<WeatherAlert> {
        horizon
            .iter()
            .enumerate()
            .filter_map(|(hour, entry)| {
                let condition = entry.weather_condition.as_deref()?;
                if !STORM_PATTERN.is_match(condition) {
                    return None;
                }
                let args = [
                    ("condition", condition.to_string()),
                    ("hours", (hour + 1).to_string()),
                ];
                Some(self.build(
                    AlertType::Storm,
                    AlertSeverity::Extreme,
                    "storm",
                    &args,
                    now,
                    self.ttl.storm,
                ))
            })
            .collect()
    }

    fn check_forecast_rain(
        &self,
        registry: &ThresholdRegistry,
        horizon: &[ForecastEntry],
        now: DateTime<Utc>,
    ) -> Vec<WeatherAlert> {
        let config = registry.get(AlertType::RainHeavy);

        horizon
            .iter()
            .enumerate()
            .filter_map(|(hour, entry)| {
                let precipitation = entry.precipitation.filter(|p| *p >= 0.0)?;
                let severity = SeverityClassifier::classify(
                    AlertType::RainHeavy,
                    Direction::Above,
                    precipitation,
                    config.threshold,
                    config.base_severity,
                )?;
                let args = [
                    ("value", format_measure(precipitation)),
                    ("threshold", format_measure(config.threshold)),
                    ("unit", "mm".to_string()),
                    ("hours", (hour + 1).to_string()),
                ];
                Some(
                    self.build(AlertType::RainHeavy, severity, "rain_heavy.expected", &args, now, self.ttl.default)
                        .with_measurement(precipitation, config.threshold, "mm"),
                )
            })
            .collect()
    }

    fn build(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        key: &str,
        args: &[(&str, String)],
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> WeatherAlert {
        let title = self.text.render(&format!("{key}.title"), args);
        let message = self.text.render(&format!("{key}.message"), args);
        WeatherAlert::new(alert_type, severity, title, message, now, ttl)
    }
}

fn current_reading(alert_type: AlertType, snapshot: &WeatherSnapshot) -> Option<(f64, Direction)> {
    let (reading, direction) = match alert_type {
        AlertType::TemperatureHigh => (snapshot.temperature, Direction::Above),
        AlertType::TemperatureLow => (snapshot.temperature, Direction::Below),
        AlertType::WindStrong => (snapshot.wind_speed, Direction::Above),
        AlertType::RainHeavy => (snapshot.precipitation, Direction::Above),
        AlertType::SnowHeavy => (snapshot.snowfall, Direction::Above),
        AlertType::UvHigh => (snapshot.uv_index, Direction::Above),
        AlertType::HumidityHigh => (snapshot.humidity, Direction::Above),
        AlertType::PressureLow => (snapshot.pressure, Direction::Below),
        AlertType::Fog => (snapshot.visibility, Direction::Below),
        // forecast-driven or handled separately
        AlertType::Storm | AlertType::AirQualityPoor => (None, Direction::Above),
    };
    reading.map(|r| (r, direction))
}

fn allows_negative(alert_type: AlertType) -> bool {
    matches!(alert_type, AlertType::TemperatureHigh | AlertType::TemperatureLow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::MemorySettings;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 14, 15, 0, 0).unwrap()
    }

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::new(AlertText::default())
    }

    fn of_type(alerts: &[WeatherAlert], alert_type: AlertType) -> Vec<&WeatherAlert> {
        alerts.iter().filter(|a| a.alert_type == alert_type).collect()
    }

    #[test]
    fn test_temperature_high_boundary_five_is_moderate() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            temperature: Some(30.0),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        let heat = of_type(&alerts, AlertType::TemperatureHigh);

        assert_eq!(heat.len(), 1);
        assert_eq!(heat[0].severity, AlertSeverity::Moderate);
        assert_eq!(heat[0].value, Some(30.0));
        assert_eq!(heat[0].threshold, Some(25.0));
        assert_eq!(heat[0].unit.as_deref(), Some("°C"));
        assert_eq!(heat[0].title, "High Temperature Alert");
        assert_eq!(heat[0].expires_at, now() + Duration::hours(6));
    }

    #[test]
    fn test_metric_at_threshold_never_triggers() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            temperature: Some(25.0),
            wind_speed: Some(20.0),
            precipitation: Some(2.0),
            snowfall: Some(5.0),
            uv_index: Some(5.0),
            humidity: Some(85.0),
            pressure: Some(980.0),
            visibility: Some(500.0),
            air_quality: Some(crate::weather::AirQuality { aqi: Some(50.0) }),
        };

        assert!(evaluator().evaluate(&registry, &snapshot, None, now()).is_empty());
    }

    #[test]
    fn test_temperature_low_uses_deficit() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            temperature: Some(-12.0),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        let cold = of_type(&alerts, AlertType::TemperatureLow);
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].severity, AlertSeverity::High);
        assert!(of_type(&alerts, AlertType::TemperatureHigh).is_empty());
    }

    #[test]
    fn test_wind_excess_over_forty_is_extreme() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            wind_speed: Some(65.0),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::WindStrong);
        assert_eq!(alerts[0].severity, AlertSeverity::Extreme);
        assert_eq!(alerts[0].unit.as_deref(), Some("km/h"));
    }

    #[test]
    fn test_disabled_type_is_suppressed() {
        let settings = MemorySettings::new();
        let mut registry = ThresholdRegistry::loaded(&settings);
        registry.set_enabled(AlertType::UvHigh, false, &settings).unwrap();

        let snapshot = WeatherSnapshot {
            uv_index: Some(9.0),
            ..Default::default()
        };
        assert!(evaluator().evaluate(&registry, &snapshot, None, now()).is_empty());
    }

    #[test]
    fn test_uv_uses_base_severity() {
        let settings = MemorySettings::new();
        let mut registry = ThresholdRegistry::loaded(&settings);
        let snapshot = WeatherSnapshot {
            uv_index: Some(11.0),
            ..Default::default()
        };
        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);

        // severity is snapshotted from configuration at creation time
        registry.update(AlertType::UvHigh, 5.0, None, &settings).unwrap();
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);
    }

    #[test]
    fn test_nan_and_negative_readings_are_ignored() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            temperature: Some(f64::NAN),
            wind_speed: Some(-80.0),
            precipitation: Some(f64::INFINITY),
            visibility: Some(-5.0),
            ..Default::default()
        };

        assert!(evaluator().evaluate(&registry, &snapshot, None, now()).is_empty());
    }

    #[test]
    fn test_direct_aqi_preferred_over_visibility() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            visibility: Some(800.0),
            air_quality: Some(crate::weather::AirQuality { aqi: Some(40.0) }),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        assert!(of_type(&alerts, AlertType::AirQualityPoor).is_empty());
    }

    #[test]
    fn test_direct_aqi_alert() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            air_quality: Some(crate::weather::AirQuality { aqi: Some(120.0) }),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        let air = of_type(&alerts, AlertType::AirQualityPoor);
        assert_eq!(air.len(), 1);
        assert_eq!(air[0].severity, AlertSeverity::High);
        assert_eq!(air[0].unit.as_deref(), Some("AQI"));
    }

    #[test]
    fn test_visibility_fallback_severity() {
        let settings = MemorySettings::new();
        let mut registry = ThresholdRegistry::loaded(&settings);
        registry.set_enabled(AlertType::Fog, false, &settings).unwrap();

        let moderate = WeatherSnapshot {
            visibility: Some(800.0),
            ..Default::default()
        };
        let alerts = evaluator().evaluate(&registry, &moderate, None, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);
        assert_eq!(alerts[0].unit.as_deref(), Some("m"));

        let high = WeatherSnapshot {
            visibility: Some(300.0),
            ..Default::default()
        };
        let alerts = evaluator().evaluate(&registry, &high, None, now());
        assert_eq!(alerts[0].severity, AlertSeverity::High);

        // 7500 m => pseudo AQI 50, not above the threshold
        let clear = WeatherSnapshot {
            visibility: Some(7500.0),
            ..Default::default()
        };
        assert!(evaluator().evaluate(&registry, &clear, None, now()).is_empty());

        // 5000 m => pseudo AQI 100, above the threshold
        let hazy = WeatherSnapshot {
            visibility: Some(5000.0),
            ..Default::default()
        };
        let alerts = evaluator().evaluate(&registry, &hazy, None, now());
        assert_eq!(alerts[0].severity, AlertSeverity::Moderate);
    }

    #[test]
    fn test_storm_lookahead() {
        let registry = ThresholdRegistry::default();
        let forecast = vec![
            ForecastEntry {
                precipitation: Some(0.0),
                weather_condition: Some("Partly cloudy".to_string()),
            },
            ForecastEntry {
                precipitation: Some(0.0),
                weather_condition: Some("Severe Thunderstorms".to_string()),
            },
        ];

        let alerts = evaluator().evaluate(&registry, &WeatherSnapshot::default(), Some(&forecast), now());
        let storms = of_type(&alerts, AlertType::Storm);

        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].severity, AlertSeverity::Extreme);
        assert_eq!(storms[0].expires_at, now() + Duration::hours(12));
        assert!(storms[0].message.contains("within 2h"));
    }

    #[test]
    fn test_lookahead_stops_at_horizon() {
        let registry = ThresholdRegistry::default();
        let mut forecast = vec![ForecastEntry::default(); 24];
        forecast.push(ForecastEntry {
            precipitation: Some(50.0),
            weather_condition: Some("thunder".to_string()),
        });

        let alerts = evaluator().evaluate(&registry, &WeatherSnapshot::default(), Some(&forecast), now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_forecast_rain_is_flavoured_expected() {
        let registry = ThresholdRegistry::default();
        let forecast = vec![ForecastEntry {
            precipitation: Some(8.0),
            weather_condition: Some("Heavy rain".to_string()),
        }];
        let snapshot = WeatherSnapshot {
            precipitation: Some(3.0),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, Some(&forecast), now());
        let rain = of_type(&alerts, AlertType::RainHeavy);

        assert_eq!(rain.len(), 2);
        assert_eq!(rain[0].title, "Heavy Rain Detected");
        assert_eq!(rain[0].severity, AlertSeverity::Low);
        assert_eq!(rain[1].title, "Heavy Rain Expected");
        assert_eq!(rain[1].severity, AlertSeverity::Moderate);
        assert_eq!(rain[1].unit.as_deref(), Some("mm"));
    }

    #[test]
    fn test_supplementary_types() {
        let registry = ThresholdRegistry::default();
        let snapshot = WeatherSnapshot {
            humidity: Some(97.0),
            pressure: Some(960.0),
            snowfall: Some(12.0),
            visibility: Some(150.0),
            ..Default::default()
        };

        let alerts = evaluator().evaluate(&registry, &snapshot, None, now());
        assert_eq!(of_type(&alerts, AlertType::HumidityHigh)[0].severity, AlertSeverity::High);
        assert_eq!(of_type(&alerts, AlertType::PressureLow)[0].severity, AlertSeverity::Extreme);
        assert_eq!(of_type(&alerts, AlertType::SnowHeavy)[0].severity, AlertSeverity::Moderate);
        assert_eq!(of_type(&alerts, AlertType::Fog)[0].severity, AlertSeverity::Moderate);
        assert_eq!(of_type(&alerts, AlertType::AirQualityPoor)[0].severity, AlertSeverity::High);
    }
}
