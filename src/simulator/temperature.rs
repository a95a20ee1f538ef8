use opcua::types::Variant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ConfigError, GenerationError};

/// Half-open integer range `[min, max)` of simulated temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureRange {
    min: i32,
    max: i32,
}

impl TemperatureRange {
    pub fn new(min: i32, max: i32) -> Result<Self, ConfigError> {
        if min >= max {
            return Err(ConfigError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..self.max).contains(&value)
    }

    fn span(&self) -> f64 {
        f64::from(self.max) - f64::from(self.min)
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: 600, max: 1000 }
    }
}

/// Scale a uniform fraction in `[0, 1)` into `range`.
pub fn scale(fraction: f64, range: TemperatureRange) -> Result<i32, GenerationError> {
    let raw = (fraction * range.span()).floor() + f64::from(range.min);
    tracing::debug!("Raw temperature value: {}", raw);

    if !raw.is_finite() {
        return Err(GenerationError::NotANumber);
    }
    if raw < f64::from(range.min) || raw >= f64::from(range.max) {
        return Err(GenerationError::OutOfRange {
            value: raw,
            min: range.min,
            max: range.max,
        });
    }

    Ok(raw as i32)
}

/// Wrap a generation result as an `Int32` variant, substituting zero on failure.
pub fn to_variant(result: Result<i32, GenerationError>) -> Variant {
    match result {
        Ok(value) => Variant::Int32(value),
        Err(e) => {
            tracing::error!("Failed to generate Int32 temperature, returning default value: {}", e);
            Variant::Int32(0)
        }
    }
}

pub struct TemperatureGenerator<R = StdRng> {
    range: TemperatureRange,
    rng: R,
}

impl TemperatureGenerator<StdRng> {
    pub fn new(range: TemperatureRange) -> Self {
        Self::with_rng(range, StdRng::from_entropy())
    }
}

impl<R: Rng> TemperatureGenerator<R> {
    pub fn with_rng(range: TemperatureRange, rng: R) -> Self {
        Self { range, rng }
    }

    pub fn range(&self) -> TemperatureRange {
        self.range
    }

    pub fn generate(&mut self) -> Result<i32, GenerationError> {
        let fraction: f64 = self.rng.gen();
        let value = scale(fraction, self.range)?;
        tracing::debug!("Temperature value: {}", value);
        Ok(value)
    }

    pub fn generate_variant(&mut self) -> Variant {
        to_variant(self.generate())
    }
}
