use crate::alerts::types::{AlertSeverity, AlertType};

/// Metric families that escalate severity with the size of the excess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    Temperature,
    Wind,
    Precipitation,
    Generic,
}

impl MetricFamily {
    /// Upper (exclusive) edges of the low, moderate and high buckets.
    /// Anything at or past the last edge is extreme.
    pub fn bucket_edges(&self) -> [f64; 3] {
        match self {
            MetricFamily::Temperature | MetricFamily::Generic => [5.0, 10.0, 15.0],
            MetricFamily::Wind => [10.0, 20.0, 40.0],
            MetricFamily::Precipitation => [5.0, 15.0, 30.0],
        }
    }
}

/// Which side of the threshold triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Buckets(MetricFamily),
    /// Severity is the configured base severity
    Base,
    Fixed(AlertSeverity),
}

impl Escalation {
    pub fn for_type(alert_type: AlertType) -> Self {
        match alert_type {
            AlertType::TemperatureHigh | AlertType::TemperatureLow => {
                Escalation::Buckets(MetricFamily::Temperature)
            }
            AlertType::WindStrong => Escalation::Buckets(MetricFamily::Wind),
            AlertType::RainHeavy | AlertType::SnowHeavy => {
                Escalation::Buckets(MetricFamily::Precipitation)
            }
            AlertType::HumidityHigh | AlertType::PressureLow => {
                Escalation::Buckets(MetricFamily::Generic)
            }
            AlertType::UvHigh | AlertType::AirQualityPoor | AlertType::Fog => Escalation::Base,
            AlertType::Storm => Escalation::Fixed(AlertSeverity::Extreme),
        }
    }
}

/// Pure threshold and bucket arithmetic. Never panics; non-finite input
/// never crosses a threshold.
pub struct SeverityClassifier;

impl SeverityClassifier {
    /// Distance past the threshold, if the measurement strictly crosses it
    pub fn crossing(direction: Direction, measured: f64, threshold: f64) -> Option<f64> {
        if !measured.is_finite() || !threshold.is_finite() {
            return None;
        }
        let excess = match direction {
            Direction::Above => measured - threshold,
            Direction::Below => threshold - measured,
        };
        (excess > 0.0).then_some(excess)
    }

    pub fn bucket(family: MetricFamily, excess: f64) -> AlertSeverity {
        let [low, moderate, high] = family.bucket_edges();
        if excess < low {
            AlertSeverity::Low
        } else if excess < moderate {
            AlertSeverity::Moderate
        } else if excess < high {
            AlertSeverity::High
        } else {
            AlertSeverity::Extreme
        }
    }

    /// Severity for a crossing measurement, or `None` when nothing crossed.
    pub fn classify(
        alert_type: AlertType,
        direction: Direction,
        measured: f64,
        threshold: f64,
        base_severity: AlertSeverity,
    ) -> Option<AlertSeverity> {
        let excess = Self::crossing(direction, measured, threshold)?;
        Some(Self::severity_for(alert_type, excess, base_severity))
    }

    pub fn severity_for(alert_type: AlertType, excess: f64, base_severity: AlertSeverity) -> AlertSeverity {
        match Escalation::for_type(alert_type) {
            Escalation::Buckets(family) => Self::bucket(family, excess),
            Escalation::Base => base_severity,
            Escalation::Fixed(severity) => severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_threshold_never_crosses() {
        assert_eq!(SeverityClassifier::crossing(Direction::Above, 25.0, 25.0), None);
        assert_eq!(SeverityClassifier::crossing(Direction::Below, 0.0, 0.0), None);
        assert_eq!(SeverityClassifier::crossing(Direction::Above, 25.1, 25.0).map(|e| e > 0.0), Some(true));
        assert_eq!(SeverityClassifier::crossing(Direction::Below, -3.0, 0.0), Some(3.0));
    }

    #[test]
    fn test_non_finite_input_does_not_cross() {
        assert_eq!(SeverityClassifier::crossing(Direction::Above, f64::NAN, 25.0), None);
        assert_eq!(SeverityClassifier::crossing(Direction::Above, f64::INFINITY, 25.0), None);
        assert_eq!(SeverityClassifier::crossing(Direction::Below, 1.0, f64::NAN), None);
    }

    #[test]
    fn test_temperature_bucket_edges() {
        let t = MetricFamily::Temperature;
        assert_eq!(SeverityClassifier::bucket(t, 4.99), AlertSeverity::Low);
        assert_eq!(SeverityClassifier::bucket(t, 5.0), AlertSeverity::Moderate);
        assert_eq!(SeverityClassifier::bucket(t, 9.99), AlertSeverity::Moderate);
        assert_eq!(SeverityClassifier::bucket(t, 10.0), AlertSeverity::High);
        assert_eq!(SeverityClassifier::bucket(t, 15.0), AlertSeverity::Extreme);
    }

    #[test]
    fn test_wind_bucket_edges() {
        let w = MetricFamily::Wind;
        assert_eq!(SeverityClassifier::bucket(w, 9.0), AlertSeverity::Low);
        assert_eq!(SeverityClassifier::bucket(w, 10.0), AlertSeverity::Moderate);
        assert_eq!(SeverityClassifier::bucket(w, 20.0), AlertSeverity::High);
        assert_eq!(SeverityClassifier::bucket(w, 39.9), AlertSeverity::High);
        assert_eq!(SeverityClassifier::bucket(w, 45.0), AlertSeverity::Extreme);
    }

    #[test]
    fn test_precipitation_bucket_edges() {
        let p = MetricFamily::Precipitation;
        assert_eq!(SeverityClassifier::bucket(p, 1.0), AlertSeverity::Low);
        assert_eq!(SeverityClassifier::bucket(p, 5.0), AlertSeverity::Moderate);
        assert_eq!(SeverityClassifier::bucket(p, 15.0), AlertSeverity::High);
        assert_eq!(SeverityClassifier::bucket(p, 30.0), AlertSeverity::Extreme);
    }

    #[test]
    fn test_severity_is_monotonic_in_excess() {
        for family in [
            MetricFamily::Temperature,
            MetricFamily::Wind,
            MetricFamily::Precipitation,
            MetricFamily::Generic,
        ] {
            let mut previous = AlertSeverity::Low;
            for step in 0..=600 {
                let excess = step as f64 * 0.1;
                let severity = SeverityClassifier::bucket(family, excess);
                assert!(severity >= previous, "{family:?} dropped at excess {excess}");
                previous = severity;
            }
            assert_eq!(previous, AlertSeverity::Extreme);
        }
    }

    #[test]
    fn test_base_and_fixed_escalation() {
        assert_eq!(
            SeverityClassifier::classify(AlertType::UvHigh, Direction::Above, 9.0, 5.0, AlertSeverity::Moderate),
            Some(AlertSeverity::Moderate)
        );
        assert_eq!(
            SeverityClassifier::severity_for(AlertType::Storm, 0.0, AlertSeverity::Low),
            AlertSeverity::Extreme
        );
        assert_eq!(
            SeverityClassifier::classify(AlertType::AirQualityPoor, Direction::Above, 50.0, 50.0, AlertSeverity::High),
            None
        );
    }
}
