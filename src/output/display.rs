use anyhow::Result;
use std::io::Write;

use crate::alerts::{AlertDisplay, AlertSeverity, WeatherAlert};

/// Prints each new alert to stderr as it is admitted, so table or JSON
/// output on stdout stays machine-readable.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub fn render(alert: &WeatherAlert) -> String {
        let marker = match alert.severity {
            AlertSeverity::Low => "[i]",
            AlertSeverity::Moderate => "[!]",
            AlertSeverity::High => "[!!]",
            AlertSeverity::Extreme => "[!!!]",
        };
        format!("{} {} ({}): {}", marker, alert.title, alert.severity, alert.message)
    }
}

impl AlertDisplay for ConsoleDisplay {
    fn show(&self, alert: &WeatherAlert) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", Self::render(alert))?;
        Ok(())
    }
}
