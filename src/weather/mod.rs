// Weather provider input shapes
pub mod snapshot;

pub use snapshot::{AirQuality, ForecastEntry, WeatherSnapshot};
