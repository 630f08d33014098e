//! Bridge configuration
//!
//! A [`BridgeConfig`] is read once when a run starts and stays fixed for that
//! run; changing it means stop, reconfigure, start. Configs load from YAML:
//!
//! ```yaml
//! network:
//!   address: 127.0.0.1
//!   port: 12345
//!   mode: polling
//! serial:
//!   device: /dev/ttyACM0
//!   baud_rate: 115200
//! refresh_interval_secs: 0.5
//! packet:
//!   variant: extended
//! ```
//!
//! Every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::types::PacketLayout;
use crate::{BridgeError, Result};

pub const DEFAULT_UDP_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_UDP_PORT: u16 = 12345;
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Accepted range for the status refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

#[cfg(windows)]
pub const DEFAULT_SERIAL_DEVICE: &str = "COM6";
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyACM0";

/// Complete configuration for one bridge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub network: ReceiverConfig,
    pub serial: SerialConfig,

    /// How often presentation layers refresh their status display
    pub refresh_interval_secs: f64,

    pub packet: PacketLayout,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            network: ReceiverConfig::default(),
            serial: SerialConfig::default(),
            refresh_interval_secs: 1.0,
            packet: PacketLayout::default(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::config_file(path.to_path_buf(), e))?;
        debug!("Loaded config file {} ({} bytes)", path.display(), text.len());
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a YAML config document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML for persistence.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check every field, reporting the first invalid one.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        if self.network.port == 0 {
            return Err(BridgeError::config("network.port", "must be between 1 and 65535"));
        }
        self.serial.validate()?;
        self.packet.validate()?;
        match Duration::try_from_secs_f64(self.refresh_interval_secs) {
            Ok(interval) if (MIN_REFRESH_INTERVAL..=MAX_REFRESH_INTERVAL).contains(&interval) => {
                Ok(())
            }
            _ => Err(BridgeError::config(
                "refresh_interval_secs",
                format!(
                    "must be between {} and {} seconds, got {}",
                    MIN_REFRESH_INTERVAL.as_secs_f64(),
                    MAX_REFRESH_INTERVAL.as_secs_f64(),
                    self.refresh_interval_secs
                ),
            )),
        }
    }

    /// Status refresh period, clamped to the accepted range.
    pub fn refresh_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.refresh_interval_secs)
            .unwrap_or(MAX_REFRESH_INTERVAL)
            .clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL)
    }
}

/// How the receiver waits for datagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveMode {
    /// Await each datagram with a timeout
    #[default]
    Blocking,
    /// Poll the socket without blocking, sleeping briefly between polls.
    /// Lowest latency at the cost of CPU time.
    Polling,
}

/// Inbound UDP endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub address: String,
    /// 0 lets the OS pick (tests only; the game needs a fixed port)
    pub port: u16,
    pub mode: ReceiveMode,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_UDP_ADDRESS.to_string(),
            port: DEFAULT_UDP_PORT,
            mode: ReceiveMode::Blocking,
            timeout_ms: 1000,
            poll_interval_ms: 1,
        }
    }
}

impl ReceiverConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.address.trim().parse().map_err(|_| {
            BridgeError::config(
                "network.address",
                format!("'{}' is not an IP address", self.address),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.timeout_ms == 0 {
            return Err(BridgeError::config("network.timeout_ms", "must be greater than zero"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.timeout_ms {
            return Err(BridgeError::config(
                "network.poll_interval_ms",
                "must be between 1 and network.timeout_ms",
            ));
        }
        Ok(())
    }
}

/// Outbound serial link settings. Framing is fixed at 8N1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
    /// Wait after opening while the controller resets
    pub settle_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_SERIAL_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: 100,
            settle_delay_ms: 2000,
        }
    }
}

impl SerialConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(BridgeError::config("serial.device", "must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(BridgeError::config("serial.baud_rate", "must be greater than zero"));
        }
        if self.write_timeout_ms == 0 {
            return Err(BridgeError::config("serial.write_timeout_ms", "must be greater than zero"));
        }
        Ok(())
    }
}
