//! Serial link to the motion controller

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Write;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::endpoint::ActuatorLink;
use crate::{BridgeError, Result};

/// Serial connection configured for 8N1 with a bounded write timeout.
///
/// Blocking port calls run on the blocking thread pool. The port is moved
/// into each write job and handed back when it finishes. Writes are never
/// drained, so each one returns within the port's write timeout.
pub struct SerialLink {
    port: Option<Box<dyn SerialPort>>,
    device: String,
    /// Last reported write outcome, to log transitions rather than every frame
    healthy: bool,
}

impl SerialLink {
    /// Open and configure the device, then wait for the controller to reset.
    ///
    /// Opening a USB serial port toggles DTR on most boards, which reboots the
    /// controller; frames sent before the settle delay are lost.
    pub async fn open(config: &SerialConfig) -> Result<Self> {
        let device = config.device.clone();
        info!("Opening serial device {} at {} baud", device, config.baud_rate);

        let builder = serialport::new(device.clone(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(config.write_timeout());

        let port = tokio::task::spawn_blocking(move || builder.open())
            .await
            .map_err(|e| BridgeError::task_failed(format!("Serial open task panicked: {}", e)))?
            .map_err(|e| BridgeError::serial_open_failed(device.clone(), e))?;

        let settle = config.settle_delay();
        if !settle.is_zero() {
            debug!("Waiting {:?} for controller on {} to reset", settle, device);
            tokio::time::sleep(settle).await;
        }

        info!("Serial device {} ready", device);
        Ok(Self::from_port(device, port))
    }

    /// Wrap an already configured port.
    pub fn from_port(device: impl Into<String>, port: Box<dyn SerialPort>) -> Self {
        Self { port: Some(port), device: device.into(), healthy: true }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn report(&mut self, outcome: std::io::Result<()>) -> bool {
        match outcome {
            Ok(()) => {
                if !self.healthy {
                    info!("Serial writes to {} recovered", self.device);
                }
                self.healthy = true;
                true
            }
            Err(e) => {
                if self.healthy {
                    if e.kind() == std::io::ErrorKind::TimedOut {
                        warn!(
                            "Serial write timeout on {}; controller might not be ready",
                            self.device
                        );
                    } else {
                        warn!("Serial write to {} failed: {}", self.device, e);
                    }
                } else {
                    debug!("Serial write to {} failed: {}", self.device, e);
                }
                self.healthy = false;
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl ActuatorLink for SerialLink {
    async fn write(&mut self, frame: &[u8]) -> bool {
        let Some(mut port) = self.port.take() else {
            return false;
        };
        let frame = frame.to_vec();

        let job = tokio::task::spawn_blocking(move || {
            // write_all is bounded by the port timeout; flush (tcdrain) is not
            let outcome = port.write_all(&frame);
            (port, outcome)
        });

        match job.await {
            Ok((port, outcome)) => {
                self.port = Some(port);
                self.report(outcome)
            }
            Err(e) => {
                // The port went down with the panicked job
                warn!("Serial write task for {} failed: {}", self.device, e);
                self.healthy = false;
                false
            }
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Closed serial device {}", self.device);
        }
    }
}
