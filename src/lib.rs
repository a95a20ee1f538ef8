pub mod config;
pub mod diagnostics;
pub mod error;
pub mod opcua_server;
pub mod simulator;
pub mod sink;
pub mod supervisor;
pub mod ws_bridge;

pub use config::Config;
pub use error::SimulatorError;
