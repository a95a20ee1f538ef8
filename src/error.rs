use opcua::types::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid temperature range [{min}, {max})")]
    InvalidRange { min: i32, max: i32 },
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generated temperature is not a number")]
    NotANumber,
    #[error("Generated temperature {value} is outside [{min}, {max})")]
    OutOfRange { value: f64, min: i32, max: i32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Signal does not contain a TemperatureValue field")]
    NoMatch,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Failed to register namespace {0}")]
    Namespace(String),
    #[error("Objects folder not found in address space")]
    MissingObjectsFolder,
    #[error("Failed to create folder {0}")]
    FolderCreation(String),
    #[error("Failed to create variable {0}")]
    VariableCreation(String),
}

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Address space initialization failed: {0}")]
    Init(#[from] InitError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OPC UA server configuration rejected")]
    ServerConfig,
    #[error("OPC UA server terminated")]
    ServerTerminated,
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("OPC UA client configuration rejected")]
    ClientConfig,
    #[error("OPC UA call failed: {0}")]
    Opcua(StatusCode),
}

impl From<StatusCode> for SimulatorError {
    fn from(value: StatusCode) -> Self {
        SimulatorError::Opcua(value)
    }
}
