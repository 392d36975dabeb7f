use std::sync::Arc;

/// Lookup of user-facing alert text by key (`"{alert_type}.title"` and friends).
/// Templates may use `{value}`, `{threshold}`, `{unit}`, `{hours}`,
/// `{condition}` and `{aqi}` placeholders.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> Option<String>;
}

/// English text shipped with the crate
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    pub fn template(key: &str) -> Option<&'static str> {
        let text = match key {
            "temperature_high.title" => "High Temperature Alert",
            "temperature_high.message" => "Temperature is {value}{unit}, above your {threshold}{unit} threshold.",
            "temperature_low.title" => "Low Temperature Alert",
            "temperature_low.message" => "Temperature has dropped to {value}{unit}, below your {threshold}{unit} threshold.",
            "wind_strong.title" => "Strong Wind Alert",
            "wind_strong.message" => "Wind speeds of {value} {unit} exceed your {threshold} {unit} threshold.",
            "rain_heavy.detected.title" => "Heavy Rain Detected",
            "rain_heavy.detected.message" => "Precipitation of {value} {unit} detected, above your {threshold} {unit} threshold.",
            "rain_heavy.expected.title" => "Heavy Rain Expected",
            "rain_heavy.expected.message" => "Up to {value} {unit} of rain expected within {hours}h.",
            "snow_heavy.title" => "Heavy Snow Alert",
            "snow_heavy.message" => "Snowfall of {value} {unit} exceeds your {threshold} {unit} threshold.",
            "storm.title" => "Storm Warning",
            "storm.message" => "{condition} expected within {hours}h. Stay indoors if possible.",
            "fog.title" => "Dense Fog Alert",
            "fog.message" => "Visibility is down to {value} {unit}. Drive carefully.",
            "uv_high.title" => "High UV Index",
            "uv_high.message" => "UV index is {value}, above your threshold of {threshold}. Use sun protection.",
            "air_quality_poor.title" => "Poor Air Quality",
            "air_quality_poor.message" => "Air quality index is {value}, above your threshold of {threshold}.",
            "air_quality_poor.visibility.message" => {
                "Visibility of {value} {unit} suggests poor air quality (estimated AQI {aqi})."
            }
            "humidity_high.title" => "High Humidity",
            "humidity_high.message" => "Humidity is {value}{unit}, above your {threshold}{unit} threshold.",
            "pressure_low.title" => "Low Pressure",
            "pressure_low.message" => "Pressure has fallen to {value} {unit}, below your {threshold} {unit} threshold.",
            _ => return None,
        };
        Some(text)
    }
}

impl Translator for BuiltinCatalog {
    fn translate(&self, key: &str) -> Option<String> {
        Self::template(key).map(str::to_string)
    }
}

/// Renders alert text through an injected translator, falling back to the
/// built-in catalog and finally to the key itself.
#[derive(Clone)]
pub struct AlertText {
    translator: Arc<dyn Translator>,
}

impl AlertText {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    pub fn render(&self, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .translator
            .translate(key)
            .or_else(|| BuiltinCatalog.translate(key))
            .unwrap_or_else(|| key.to_string());

        args.iter().fold(template, |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
    }
}

impl Default for AlertText {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinCatalog))
    }
}

/// Compact number formatting for alert text: `30`, `2.5`, `0.25`
pub fn format_measure(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}
