use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use temperature_simulator::config::{Config, ValueStrategy};
use temperature_simulator::opcua_server::{self, TemperatureNodes};
use temperature_simulator::simulator::TemperatureGenerator;
use temperature_simulator::sink::{FanoutSink, LogSink, MonitoringSink};
use temperature_simulator::ws_bridge::{self, DashboardSink};
use temperature_simulator::{diagnostics, SimulatorError};

#[derive(Debug, Parser)]
#[command(name = "temperature-simulator", about = "OPC UA server publishing a simulated temperature")]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };

    let level = config
        .as_ref()
        .map(|c| c.log_level.0.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Temperature simulator error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Shutting down");
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<(), SimulatorError> {
    tracing::info!("Starting Temperature Simulation Publisher");

    // Build server and populate address space
    let range = config.simulation.range()?;
    let server = opcua_server::build_server(&config.server)?;
    let address_space = server.address_space();

    // Initialization failures leave the listener up with an incomplete namespace.
    let nodes = {
        let mut address_space = address_space.write();
        match opcua_server::initialize(
            &mut address_space,
            &config.address_space,
            config.simulation.strategy,
            range,
        ) {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                tracing::error!("Failed to initialize address space: {}", e);
                None
            }
        }
    };

    // Run OPC UA server on its own thread
    let (server_done_tx, server_done_rx) = oneshot::channel();
    std::thread::spawn(move || {
        server.run();
        let _ = server_done_tx.send(());
    });
    tracing::info!("OPC UA server is running at {}", config.server.endpoint_url());

    diagnostics::log_host_addresses(&config.diagnostics).await;

    // Start monitoring sinks
    let mut tasks = JoinSet::new();
    let sink = build_sink(&config, &mut tasks);

    if let Some(nodes) = nodes {
        tracing::info!("Temperature item: {} (Int32)", nodes.item_descriptor());

        if config.simulation.strategy == ValueStrategy::OnTimer {
            let address_space = address_space.clone();
            let node_id = nodes.temperature_id.clone();
            let interval_ms = config.simulation.refresh_interval_ms;
            tasks.spawn(async move {
                opcua_server::refresh_loop(address_space, node_id, TemperatureGenerator::new(range), interval_ms)
                    .await;
                "Temperature refresh loop"
            });
        }

        if config.monitor.enabled {
            spawn_monitor(&config, nodes, sink);
        }
    }

    let mut generator = TemperatureGenerator::new(range);
    tracing::info!(
        "Temperature generator ready, sample value {:?}",
        generator.generate_variant()
    );

    // Run until Ctrl+C or until the server or a task ends
    temperature_simulator::supervisor::supervise(tokio::signal::ctrl_c(), server_done_rx, &mut tasks).await
}

fn build_sink(config: &Config, tasks: &mut JoinSet<&'static str>) -> Arc<dyn MonitoringSink> {
    let mut sink = FanoutSink::new().with(Arc::new(LogSink));

    if config.dashboard.enabled {
        let (tx, _rx) = broadcast::channel(config.dashboard.channel_capacity);
        sink = sink.with(Arc::new(DashboardSink::new(tx.clone())));

        let port = config.dashboard.port;
        tasks.spawn(async move {
            if let Err(e) = ws_bridge::start_ws_server(tx, port).await {
                tracing::error!("Dashboard server error: {}", e);
            }
            "Dashboard server"
        });
    }

    Arc::new(sink)
}

/// The monitor client blocks, so it gets its own thread once the server had
/// time to bind.
fn spawn_monitor(config: &Config, nodes: TemperatureNodes, sink: Arc<dyn MonitoringSink>) {
    let settings = config.monitor.clone();
    let endpoint_url = config.server.local_endpoint_url();

    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(settings.startup_delay_ms));

        if let Err(e) = opcua_server::run_monitor(settings, endpoint_url, nodes.temperature_id, sink) {
            tracing::error!("Temperature monitor error: {}", e);
        }
    });
}
