//! Chirp Agent - Main Entry Point
//!
//! One-time setup (logging, configuration, capability wiring), then the
//! cycle loop: active-wait builds run cycles forever, deep-sleep builds
//! run exactly one cycle and exit so the platform scheduler can relaunch
//! the process next period.

use chirp_agent::config::{AgentConfig, SuspendMode};
use chirp_agent::connectivity::ConnectivityManager;
use chirp_agent::cycle::CycleController;
use chirp_agent::observability::init_default_logging;
use chirp_agent::sensor::{SoilSensor, StubSensor};
use chirp_agent::suspend::{ActiveWait, OneShot, SuspendOutcome, SuspendStrategy};
use chirp_agent::transport::link::OsManagedLink;
use chirp_agent::transport::MqttBroker;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tracing::{error, info};

/// Soil moisture and light telemetry agent
#[derive(Parser)]
#[command(name = "chirp-agent")]
#[command(about = "Periodic soil moisture/light telemetry to Domoticz over MQTT")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run telemetry cycles
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting chirp-agent v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_agent(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Agent shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AgentConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AgentConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations; deployment defaults apply when no
            // file exists, since everything is a compiled-in constant.
            let default_paths = ["chirp-agent.toml", "config/chirp-agent.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AgentConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using deployment defaults");
            Ok(AgentConfig::default())
        }
    }
}

async fn run_agent(config: AgentConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(device_id = %config.device.id, "agent starting");

    let mut controller = build_controller(config);

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    loop {
        tokio::select! {
            outcome = controller.run_cycle() => {
                if outcome == SuspendOutcome::Halt {
                    break;
                }
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Capability factory - all wiring lives here, separated from cycle logic.
struct CapabilityFactory;

impl CapabilityFactory {
    fn create_sensors(config: &AgentConfig) -> (Box<dyn SoilSensor>, Box<dyn SoilSensor>) {
        (
            Box::new(StubSensor::new(config.sensors.addr_a)),
            Box::new(StubSensor::new(config.sensors.addr_b)),
        )
    }

    fn create_suspend(config: &AgentConfig) -> Box<dyn SuspendStrategy> {
        match config.cycle.suspend {
            SuspendMode::ActiveWait => Box::new(ActiveWait),
            SuspendMode::DeepSleep => Box::new(OneShot),
        }
    }
}

fn build_controller(config: AgentConfig) -> CycleController<OsManagedLink, MqttBroker> {
    let link = OsManagedLink::new(&config.link);
    let broker = MqttBroker::new(&config.device.id, config.mqtt.clone());

    let connectivity = ConnectivityManager::new(
        link,
        broker,
        &config.link,
        &config.mqtt,
        config.cycle.flush_wait(),
        config.precheck.clone(),
    );

    let (sensor_a, sensor_b) = CapabilityFactory::create_sensors(&config);
    let suspend = CapabilityFactory::create_suspend(&config);

    CycleController::new(config, sensor_a, sensor_b, connectivity, suspend)
}

fn handle_config_command(
    config: AgentConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
