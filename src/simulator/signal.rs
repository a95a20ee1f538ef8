use regex::Regex;
use std::sync::OnceLock;

use crate::error::SignalError;

fn signal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"TemperatureValue=(?<value>\d+(?:\.\d+)?)?").expect("signal pattern is valid")
    })
}

/// Extract the reading from a `TemperatureValue=<number>` signal string.
///
/// A signal carrying the key with a missing or unparseable number reads as
/// `0.0`. A signal without the key is an error.
pub fn parse_signal(signal: &str) -> Result<f64, SignalError> {
    let captures = signal_pattern().captures(signal).ok_or(SignalError::NoMatch)?;
    let Some(raw) = captures.name("value").map(|m| m.as_str()) else {
        tracing::warn!("Signal {:?} carries no temperature number, returning default value", signal);
        return Ok(0.0);
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            tracing::debug!("Parsed signal temperature value: {}", value);
            Ok(value)
        }
        _ => {
            tracing::warn!("Failed to convert signal value {:?} to double, returning default value", raw);
            Ok(0.0)
        }
    }
}
