//! Runtime configuration.
//!
//! Every default reproduces the fixed values the simulator has always run
//! with, so an empty or missing config file yields the stock endpoint on
//! port 4840 publishing `Objects/Simulations/Temperature`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::simulator::TemperatureRange;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub server: ServerSettings,
    pub address_space: AddressSpaceSettings,
    pub simulation: SimulationSettings,
    pub monitor: MonitorSettings,
    pub dashboard: DashboardSettings,
    pub diagnostics: DiagnosticsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub application_name: String,
    pub application_uri: String,
    pub product_uri: String,
    pub host: String,
    pub port: u16,
    pub endpoint_path: String,
    pub pki_dir: PathBuf,
    pub create_sample_keypair: bool,
    pub secure_token_lifetime_ms: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            application_name: "Temperature Simulator".to_string(),
            application_uri: "urn:TemperatureSimulator".to_string(),
            product_uri: "urn:TemperatureSimulator".to_string(),
            host: "0.0.0.0".to_string(),
            port: 4840,
            endpoint_path: "/".to_string(),
            pki_dir: PathBuf::from("./pki-server"),
            create_sample_keypair: true,
            secure_token_lifetime_ms: 60_000,
        }
    }
}

impl ServerSettings {
    pub fn endpoint_url(&self) -> String {
        format!("opc.tcp://{}:{}{}", self.host, self.port, self.endpoint_path)
    }

    /// Endpoint URL for clients running on the same machine.
    pub fn local_endpoint_url(&self) -> String {
        format!("opc.tcp://localhost:{}{}", self.port, self.endpoint_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressSpaceSettings {
    pub namespace_uri: String,
    pub folder_name: String,
    pub variable_name: String,
}

impl Default for AddressSpaceSettings {
    fn default() -> Self {
        Self {
            namespace_uri: "urn:temperature-simulator".to_string(),
            folder_name: "Simulations".to_string(),
            variable_name: "Temperature".to_string(),
        }
    }
}

/// How the temperature variable obtains fresh values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStrategy {
    /// A value getter draws a new temperature on every read or sample.
    #[default]
    OnRead,
    /// The value is set at creation and rewritten by a periodic task.
    OnTimer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub strategy: ValueStrategy,
    pub refresh_interval_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            min_temperature: 600,
            max_temperature: 1000,
            strategy: ValueStrategy::OnRead,
            refresh_interval_ms: 1000,
        }
    }
}

impl SimulationSettings {
    pub fn range(&self) -> Result<TemperatureRange, ConfigError> {
        TemperatureRange::new(self.min_temperature, self.max_temperature)
    }
}

/// Monitored item and subscription parameters for the change monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub startup_delay_ms: u64,
    pub application_name: String,
    pub application_uri: String,
    pub pki_dir: PathBuf,
    pub client_handle: u32,
    pub sampling_interval_ms: f64,
    pub queue_size: u32,
    pub discard_oldest: bool,
    pub publishing_interval_ms: f64,
    pub lifetime_count: u32,
    pub max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub publishing_enabled: bool,
    pub priority: u8,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            startup_delay_ms: 2000,
            application_name: "Temperature Monitor".to_string(),
            application_uri: "urn:TemperatureMonitor".to_string(),
            pki_dir: PathBuf::from("./pki-monitor"),
            client_handle: 1,
            sampling_interval_ms: 1000.0,
            queue_size: 10,
            discard_oldest: true,
            publishing_interval_ms: 1000.0,
            lifetime_count: 100,
            max_keep_alive_count: 10,
            max_notifications_per_publish: 100,
            publishing_enabled: true,
            priority: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub enabled: bool,
    pub port: u16,
    pub channel_capacity: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 3000,
            channel_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    pub resolve_local_host: bool,
    pub peer_hosts: Vec<String>,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            resolve_local_host: true,
            peer_hosts: vec!["localhost".to_string()],
        }
    }
}

impl Config {
    /// Load a TOML config file. Missing sections and keys fall back to
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.range()?;

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                name: "server.port",
                reason: "must be non-zero".to_string(),
            });
        }
        if !self.server.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                name: "server.endpoint_path",
                reason: format!("{:?} must start with '/'", self.server.endpoint_path),
            });
        }
        if self.simulation.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "simulation.refresh_interval_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.monitor.sampling_interval_ms <= 0.0 || self.monitor.publishing_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "monitor",
                reason: "sampling and publishing intervals must be positive".to_string(),
            });
        }
        if self.monitor.queue_size == 0 {
            return Err(ConfigError::Invalid {
                name: "monitor.queue_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.dashboard.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "dashboard.channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_stock_endpoint() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.server.port, 4840);
        assert_eq!(config.server.secure_token_lifetime_ms, 60_000);
        assert_eq!(config.server.endpoint_url(), "opc.tcp://0.0.0.0:4840/");
        assert_eq!(config.server.local_endpoint_url(), "opc.tcp://localhost:4840/");
        assert_eq!(config.address_space.folder_name, "Simulations");
        assert_eq!(config.address_space.variable_name, "Temperature");
        assert_eq!(config.simulation.min_temperature, 600);
        assert_eq!(config.simulation.max_temperature, 1000);
        assert_eq!(config.simulation.strategy, ValueStrategy::OnRead);
        assert_eq!(config.log_level.0, "info");
    }

    #[test]
    fn monitor_defaults() {
        let monitor = MonitorSettings::default();
        assert_eq!(monitor.sampling_interval_ms, 1000.0);
        assert_eq!(monitor.queue_size, 10);
        assert!(monitor.discard_oldest);
        assert_eq!(monitor.publishing_interval_ms, 1000.0);
        assert_eq!(monitor.lifetime_count, 100);
        assert_eq!(monitor.max_keep_alive_count, 10);
        assert_eq!(monitor.max_notifications_per_publish, 100);
        assert!(monitor.publishing_enabled);
        assert_eq!(monitor.priority, 10);
    }

    #[test]
    fn load_partial_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[server]
port = 4850

[simulation]
strategy = "on_timer"
refresh_interval_ms = 500

[dashboard]
enabled = true
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.log_level.0, "debug");
        assert_eq!(config.server.port, 4850);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.simulation.strategy, ValueStrategy::OnTimer);
        assert_eq!(config.simulation.refresh_interval_ms, 500);
        assert_eq!(config.simulation.min_temperature, 600);
        assert!(config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 3000);
    }

    #[test]
    fn load_rejects_inverted_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nmin_temperature = 1000\nmax_temperature = 600").unwrap();

        match Config::load(file.path()) {
            Err(ConfigError::InvalidRange { min, max }) => {
                assert_eq!(min, 1000);
                assert_eq!(max, 600);
            }
            other => panic!("expected InvalidRange, got {:?}", other),
        }
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn validate_rejects_zero_queue() {
        let mut config = Config::default();
        config.monitor.queue_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "monitor.queue_size", .. })
        ));
    }
}
