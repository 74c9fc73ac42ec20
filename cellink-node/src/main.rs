//! Telemetry node — entry point.
//!
//! ```text
//! cellink-node                    Run with ./cellink-node.toml (or defaults)
//! cellink-node --config <path>    Load a custom config TOML
//! cellink-node --gen-config       Write default config to stdout
//! cellink-node --role subscriber  Override the configured role
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cellink_node::config::NodeConfig;
use cellink_node::sensor::SimulatedSensor;
use cellink_node::service::TelemetryService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cellink-node", about = "Cellular telemetry node")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "cellink-node.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Override the configured role ("publisher" or "subscriber").
    #[arg(long)]
    role: Option<String>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&NodeConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let mut config = NodeConfig::load(&cli.config);
    if let Some(role) = cli.role {
        config.telemetry.role = role;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("cellink-node v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "modem: {} @ {} baud",
        config.serial.device, config.serial.baud_rate
    );
    info!("broker: {}:{}", config.network.host, config.network.port);
    info!("role: {}", config.telemetry.role);

    let service = TelemetryService::new(config);
    let shutdown = service.shutdown_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        shutdown.cancel();
    });

    // A clean, signal-triggered shutdown exits 0; any unrecoverable
    // workflow failure propagates and exits non-zero.
    service.run(SimulatedSensor::new()).await?;

    Ok(())
}
