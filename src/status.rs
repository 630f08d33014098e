//! Status reporting for console front ends

use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::StateHandle;
use crate::config::MIN_REFRESH_INTERVAL;
use crate::types::{BridgeState, LinkStatus};

/// Silence after which the reporter reminds the user to check Data Out.
pub const DEFAULT_SILENCE_WARNING: Duration = Duration::from_secs(10);

/// One-line human summary of a snapshot.
///
/// ```text
/// TX ok   ACTIVE | Packets: 10 | Speed:  67.1 mph ( 108.0 km/h) | RPM: 5200 | G-Forces: ...
/// ```
pub fn status_line(state: &BridgeState) -> String {
    let telemetry = &state.last_telemetry;
    let g = &state.last_gforces;

    let mut line = format!(
        "{} {} | Packets: {} | Speed: {:5.1} mph ({:6.1} km/h) | RPM: {:4.0}",
        if state.last_write_succeeded { "TX ok  " } else { "TX fail" },
        if state.is_active { "ACTIVE" } else { "IDLE  " },
        state.packet_count,
        telemetry.speed_mph(),
        telemetry.speed_kmh(),
        telemetry.engine_rpm,
    );
    line.push_str(&format!(
        " | G-Forces: Long:{:+5.2} Lat:{:+5.2} Vert:{:+5.2}",
        g.longitudinal, g.lateral, g.vertical
    ));

    if let Some(inputs) = telemetry.inputs {
        line.push_str(&format!(
            " | Throttle: {:.1}% Brake: {:.1}% Steering: {:+}",
            inputs.throttle_percent(),
            inputs.brake_percent(),
            inputs.steering
        ));
    }
    if let Some(suspension) = telemetry.suspension {
        line.push_str(&format!(
            " | Suspension: FL:{:.2} FR:{:.2} RL:{:.2} RR:{:.2}",
            suspension.front_left,
            suspension.front_right,
            suspension.rear_left,
            suspension.rear_right
        ));
    }

    line
}

/// Tracks how long the packet counter has stood still.
#[derive(Debug, Clone)]
pub struct SilenceMonitor {
    threshold: Duration,
    last_count: u64,
    last_change: Instant,
}

impl SilenceMonitor {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self { threshold, last_count: 0, last_change: now }
    }

    /// Record the current packet count. Returns true once per silent period
    /// longer than the threshold.
    pub fn observe(&mut self, packet_count: u64, now: Instant) -> bool {
        if packet_count != self.last_count {
            self.last_count = packet_count;
            self.last_change = now;
            return false;
        }

        if now.duration_since(self.last_change) >= self.threshold {
            self.last_change = now;
            return true;
        }
        false
    }
}

/// Periodically logs the bridge status, the way the console variant prints it.
pub struct StatusReporter {
    handle: StateHandle,
    interval: Duration,
    silence_warning: Duration,
    listen_port: Option<u16>,
}

impl StatusReporter {
    pub fn new(handle: StateHandle, interval: Duration) -> Self {
        Self { handle, interval, silence_warning: DEFAULT_SILENCE_WARNING, listen_port: None }
    }

    /// Silence after which a warning is logged.
    pub fn with_silence_warning(mut self, silence_warning: Duration) -> Self {
        self.silence_warning = silence_warning;
        self
    }

    /// Port named in the silence warning.
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Report until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval.max(MIN_REFRESH_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut silence = SilenceMonitor::new(self.silence_warning, Instant::now());
        let mut last_status = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let state = self.handle.snapshot();
            let status = state.link_status();

            if last_status != Some(status) {
                info!("Bridge status: {}", status);
                last_status = Some(status);
            }

            match status {
                LinkStatus::Stopped => debug!("Bridge stopped"),
                LinkStatus::WaitingForData | LinkStatus::Connected => {
                    if status == LinkStatus::Connected {
                        info!("{}", status_line(&state));
                    }
                    if silence.observe(state.packet_count, Instant::now()) {
                        match self.listen_port {
                            Some(port) => warn!(
                                "No telemetry data for {:?}; enable Data Out on port {}",
                                self.silence_warning, port
                            ),
                            None => warn!("No telemetry data for {:?}", self.silence_warning),
                        }
                    }
                }
            }
        }

        debug!("Status reporter stopped");
    }
}
