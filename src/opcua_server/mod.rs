pub mod address_space;
pub mod monitor;
pub mod server;

pub use address_space::{initialize, refresh_loop, TemperatureNodes};
pub use monitor::run_monitor;
pub use server::build_server;
