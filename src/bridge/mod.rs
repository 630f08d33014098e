//! Bridge lifecycle: start, run, stop
//!
//! A [`Bridge`] moves through `Stopped -> Starting -> Running -> Stopping ->
//! Stopped`. Starting opens both endpoints; if either fails, whatever opened is
//! closed again and the bridge stays stopped. Running spawns one processing
//! task that owns the endpoints and is the only writer of [`BridgeState`].
//! Stopping cancels that task, waits for its current iteration, and resets the
//! published state.

mod handle;
mod worker;

#[cfg(test)]
mod tests;

pub use handle::StateHandle;

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::endpoint::{ActuatorLink, TelemetrySource};
use crate::endpoints::{SerialLink, UdpReceiver};
use crate::pipeline::Pipeline;
use crate::types::{BridgePhase, BridgeState, PacketLayout};
use crate::{BridgeError, Result};

/// Owner of one telemetry-to-actuator bridge.
pub struct Bridge {
    state: Arc<watch::Sender<BridgeState>>,
    phase: watch::Sender<BridgePhase>,
    /// Held so channel sends never fail for lack of receivers
    handle: StateHandle,
    running: Option<RunningTask>,
}

struct RunningTask {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        let (state, state_rx) = watch::channel(BridgeState::default());
        let (phase, phase_rx) = watch::channel(BridgePhase::Stopped);

        Self {
            state: Arc::new(state),
            phase,
            handle: StateHandle::new(state_rx, phase_rx),
            running: None,
        }
    }

    /// Read-only handle for presentation layers.
    pub fn state(&self) -> StateHandle {
        self.handle.clone()
    }

    pub fn snapshot(&self) -> BridgeState {
        self.handle.snapshot()
    }

    pub fn phase(&self) -> BridgePhase {
        self.handle.phase()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Open the configured UDP receiver and serial link, then start forwarding.
    ///
    /// Fails without side effects if the bridge is not stopped, the config is
    /// invalid, or either endpoint cannot be opened.
    pub async fn start(&mut self, config: &BridgeConfig) -> Result<()> {
        self.ensure_stopped()?;
        config.validate()?;

        info!("Starting bridge");
        self.phase.send_replace(BridgePhase::Starting);

        match open_endpoints(config).await {
            Ok((source, link)) => {
                self.launch(source, link, config.packet);
                Ok(())
            }
            Err(e) => {
                error!("Bridge failed to start: {}", e);
                self.phase.send_replace(BridgePhase::Stopped);
                Err(e)
            }
        }
    }

    /// Start forwarding between already opened endpoints.
    pub async fn start_with<S, L>(&mut self, source: S, link: L, layout: PacketLayout) -> Result<()>
    where
        S: TelemetrySource,
        L: ActuatorLink,
    {
        self.ensure_stopped()?;
        self.phase.send_replace(BridgePhase::Starting);
        self.launch(source, link, layout);
        Ok(())
    }

    /// Stop forwarding and close both endpoints.
    ///
    /// Waits for the processing task to finish its current iteration, which
    /// takes at most one receive timeout plus one write timeout. Stopping a
    /// stopped bridge does nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            debug!("Stop requested while already stopped");
            return Ok(());
        };

        info!("Stopping bridge");
        self.phase.send_replace(BridgePhase::Stopping);
        running.cancel.cancel();

        let joined = running.task.await;

        self.state.send_replace(BridgeState::default());
        self.phase.send_replace(BridgePhase::Stopped);

        match joined {
            Ok(()) => {
                info!("Bridge stopped");
                Ok(())
            }
            Err(e) => {
                error!("Processing task failed: {}", e);
                Err(BridgeError::task_failed(format!("Processing task failed: {}", e)))
            }
        }
    }

    fn ensure_stopped(&self) -> Result<()> {
        match self.phase() {
            BridgePhase::Stopped => Ok(()),
            phase => Err(BridgeError::AlreadyRunning { phase: phase.to_string() }),
        }
    }

    fn launch<S, L>(&mut self, source: S, link: L, layout: PacketLayout)
    where
        S: TelemetrySource,
        L: ActuatorLink,
    {
        if let Some(addr) = source.local_addr() {
            info!("Bridge running on udp://{}", addr);
        }

        self.state.send_replace(BridgeState::running());

        let cancel = CancellationToken::new();
        let task = tokio::spawn(worker::run(
            source,
            link,
            Pipeline::new(layout),
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        self.running = Some(RunningTask { cancel, task });
        self.phase.send_replace(BridgePhase::Running);
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            warn!("Bridge dropped while running; cancelling processing task");
            running.cancel.cancel();
        }
    }
}

/// Bind the receiver, then open the link. A failed link open closes the receiver.
async fn open_endpoints(config: &BridgeConfig) -> Result<(UdpReceiver, SerialLink)> {
    let mut source = UdpReceiver::bind(&config.network).await?;

    match SerialLink::open(&config.serial).await {
        Ok(link) => Ok((source, link)),
        Err(e) => {
            source.close();
            Err(e)
        }
    }
}
