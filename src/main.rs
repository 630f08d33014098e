//! motionlink - Forza telemetry to motion platform bridge
//!
//! Listens for "Data Out" packets and streams G-force frames to the actuator
//! controller until interrupted.

#![deny(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motionlink::status::DEFAULT_SILENCE_WARNING;
use motionlink::{Bridge, BridgeConfig, PacketVariant, ReceiveMode, StatusReporter};

#[derive(Parser, Debug)]
#[command(name = "motionlink")]
#[command(about = "Forward Forza telemetry to a motion platform over serial")]
#[command(version)]
struct Cli {
    /// YAML configuration file; flags below override its values
    #[arg(short, long, env = "MOTIONLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on for telemetry
    #[arg(long)]
    address: Option<String>,

    /// UDP port matching the game's Data Out port
    #[arg(short, long)]
    port: Option<u16>,

    /// Serial device of the actuator controller
    #[arg(short, long)]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Status refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<f64>,

    /// Send throttle, brake, steering and suspension with each frame
    #[arg(long)]
    extended: bool,

    /// Poll the socket instead of blocking (lower latency, more CPU)
    #[arg(long)]
    polling: bool,

    /// Seconds without telemetry before warning about Data Out settings
    #[arg(long, default_value_t = DEFAULT_SILENCE_WARNING.as_secs())]
    silence_warning: u64,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags.
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => BridgeConfig::default(),
        };

        if let Some(address) = &self.address {
            config.network.address = address.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(device) = &self.serial {
            config.serial.device = device.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(refresh) = self.refresh {
            config.refresh_interval_secs = refresh;
        }
        if self.extended {
            config.packet.variant = PacketVariant::Extended;
        }
        if self.polling {
            config.network.mode = ReceiveMode::Polling;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("motionlink={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = cli.bridge_config()?;
    run(config, Duration::from_secs(cli.silence_warning)).await
}

async fn run(config: BridgeConfig, silence_warning: Duration) -> Result<()> {
    info!(
        "Forwarding udp://{}:{} to {} at {} baud ({:?} frames)",
        config.network.address,
        config.network.port,
        config.serial.device,
        config.serial.baud_rate,
        config.packet.variant
    );

    let mut bridge = Bridge::new();
    if let Err(e) = bridge.start(&config).await {
        error!("{}", e);
        for suggestion in e.recovery_suggestions() {
            error!("  - {}", suggestion);
        }
        return Err(e).context("Bridge failed to start");
    }

    let cancel = CancellationToken::new();
    let reporter = StatusReporter::new(bridge.state(), config.refresh_interval())
        .with_silence_warning(silence_warning)
        .with_listen_port(config.network.port);
    let reporter = tokio::spawn(reporter.run(cancel.clone()));

    info!("Press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");

    cancel.cancel();
    let stopped = bridge.stop().await;
    if let Err(e) = reporter.await {
        error!("Status reporter failed: {}", e);
    }

    stopped.context("Bridge failed to stop cleanly")
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn no_flags_yields_default_config() -> TestResult {
        let cli = Cli::try_parse_from(["motionlink"])?;
        assert_eq!(cli.bridge_config()?, BridgeConfig::default());
        assert_eq!(cli.silence_warning, 10);
        Ok(())
    }

    #[test]
    fn flags_override_config() -> TestResult {
        let cli = Cli::try_parse_from([
            "motionlink",
            "--address",
            "0.0.0.0",
            "--port",
            "5300",
            "--serial",
            "/dev/ttyUSB1",
            "--baud",
            "9600",
            "--refresh",
            "0.5",
            "--extended",
            "--polling",
            "--silence-warning",
            "30",
        ])?;

        let config = cli.bridge_config()?;
        assert_eq!(config.network.address, "0.0.0.0");
        assert_eq!(config.network.port, 5300);
        assert_eq!(config.network.mode, ReceiveMode::Polling);
        assert_eq!(config.serial.device, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.refresh_interval_secs, 0.5);
        assert!(config.packet.is_extended());
        assert_eq!(cli.silence_warning, 30);
        Ok(())
    }

    #[test]
    fn missing_config_file_is_an_error() -> TestResult {
        let cli = Cli::try_parse_from(["motionlink", "--config", "/nonexistent/motionlink.yaml"])?;
        assert!(cli.bridge_config().is_err());
        Ok(())
    }
}
