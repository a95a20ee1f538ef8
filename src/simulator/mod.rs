pub mod signal;
pub mod temperature;

pub use signal::parse_signal;
pub use temperature::{TemperatureGenerator, TemperatureRange};
