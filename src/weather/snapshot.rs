use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Current conditions as supplied by the weather provider.
/// Every field is optional; an absent field just skips its checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,   // °C
    pub wind_speed: Option<f64>,    // km/h
    pub humidity: Option<f64>,      // %
    pub pressure: Option<f64>,      // hPa
    pub visibility: Option<f64>,    // m
    pub precipitation: Option<f64>, // mm
    pub snowfall: Option<f64>,      // cm
    pub uv_index: Option<f64>,
    pub air_quality: Option<AirQuality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQuality {
    pub aqi: Option<f64>,
}

/// One hourly forecast entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastEntry {
    pub precipitation: Option<f64>,
    pub weather_condition: Option<String>,
}

impl WeatherSnapshot {
    /// Pull each metric out of an arbitrary provider document.
    ///
    /// A field of the wrong shape is logged and treated as absent; the rest
    /// of the snapshot is still usable.
    pub fn from_json(document: &Value) -> Self {
        if !document.is_object() {
            warn!("Weather snapshot is not an object, ignoring it");
            return Self::default();
        }

        let aqi = match document.get("air_quality") {
            None | Some(Value::Null) => None,
            Some(air) if air.is_object() => number_field(air, "aqi", "air_quality.aqi"),
            Some(other) => {
                warn!("Unexpected air_quality value {}, skipping air quality", other);
                None
            }
        };

        Self {
            temperature: number_field(document, "temperature", "temperature"),
            wind_speed: number_field(document, "wind_speed", "wind_speed"),
            humidity: number_field(document, "humidity", "humidity"),
            pressure: number_field(document, "pressure", "pressure"),
            visibility: number_field(document, "visibility", "visibility"),
            precipitation: number_field(document, "precipitation", "precipitation"),
            snowfall: number_field(document, "snowfall", "snowfall"),
            uv_index: number_field(document, "uv_index", "uv_index"),
            air_quality: aqi.map(|aqi| AirQuality { aqi: Some(aqi) }),
        }
    }

    pub fn aqi(&self) -> Option<f64> {
        self.air_quality.as_ref().and_then(|a| a.aqi)
    }
}

impl ForecastEntry {
    pub fn from_json(document: &Value) -> Self {
        let weather_condition = match document.get("weather_condition") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                warn!("Unexpected weather_condition value {}, skipping it", other);
                None
            }
        };
        Self {
            precipitation: number_field(document, "precipitation", "forecast.precipitation"),
            weather_condition,
        }
    }

    /// Parse a forecast array; anything that is not an array yields no entries.
    pub fn list_from_json(document: &Value) -> Vec<Self> {
        match document {
            Value::Array(entries) => entries.iter().map(Self::from_json).collect(),
            Value::Null => Vec::new(),
            other => {
                warn!("Forecast is not an array ({}), ignoring it", kind(other));
                Vec::new()
            }
        }
    }
}

fn number_field(document: &Value, key: &str, label: &str) -> Option<f64> {
    match document.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let value = n.as_f64()?;
            if value.is_finite() {
                Some(value)
            } else {
                debug!("Non-finite {} value, treating as missing", label);
                None
            }
        }
        // Some providers quote their numbers
        Some(Value::String(text)) => match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                warn!("Could not read {} from {:?}, skipping it", label, text);
                None
            }
        },
        Some(other) => {
            warn!("Unexpected {} value of type {}, skipping it", label, kind(other));
            None
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_reads_present_fields() {
        let snapshot = WeatherSnapshot::from_json(&json!({
            "temperature": 30,
            "wind_speed": 12.5,
            "air_quality": {"aqi": 80}
        }));

        assert_eq!(snapshot.temperature, Some(30.0));
        assert_eq!(snapshot.wind_speed, Some(12.5));
        assert_eq!(snapshot.aqi(), Some(80.0));
        assert_eq!(snapshot.humidity, None);
    }

    #[test]
    fn test_from_json_skips_malformed_fields() {
        let snapshot = WeatherSnapshot::from_json(&json!({
            "temperature": {"celsius": 30},
            "uv_index": "9",
            "pressure": "low",
            "air_quality": 42,
            "visibility": null
        }));

        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.uv_index, Some(9.0));
        assert_eq!(snapshot.pressure, None);
        assert_eq!(snapshot.aqi(), None);
        assert_eq!(snapshot.visibility, None);
    }

    #[test]
    fn test_from_json_non_object_is_empty() {
        assert_eq!(WeatherSnapshot::from_json(&json!([1, 2])), WeatherSnapshot::default());
    }

    #[test]
    fn test_forecast_list() {
        let entries = ForecastEntry::list_from_json(&json!([
            {"precipitation": 3.2, "weather_condition": "Light rain"},
            {"precipitation": "heavy", "weather_condition": 5},
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].precipitation, Some(3.2));
        assert_eq!(entries[0].weather_condition.as_deref(), Some("Light rain"));
        assert_eq!(entries[1], ForecastEntry::default());

        assert!(ForecastEntry::list_from_json(&json!({"hourly": []})).is_empty());
    }

    #[test]
    fn test_typed_deserialize_tolerates_missing_fields() {
        let snapshot: WeatherSnapshot = serde_json::from_value(json!({"humidity": 91.0})).unwrap();
        assert_eq!(snapshot.humidity, Some(91.0));
        assert!(snapshot.air_quality.is_none());
    }
}
