//! Shared bridge state observed by presentation layers

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GForces, TelemetryRecord};

/// Latest-known state of a bridge run.
///
/// Written only by the processing task. Readers receive a copy, so every
/// field of one snapshot comes from the same packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BridgeState {
    pub is_running: bool,

    /// Set on the first decoded packet, cleared only on stop
    pub is_connected: bool,

    /// Successfully decoded packets this run
    pub packet_count: u64,

    pub last_telemetry: TelemetryRecord,
    pub last_gforces: GForces,

    /// Outcome of the most recent serial write
    pub last_write_succeeded: bool,

    pub is_active: bool,
}

impl BridgeState {
    /// Fresh state for a run that has just started.
    pub fn running() -> Self {
        Self { is_running: true, ..Self::default() }
    }

    pub fn link_status(&self) -> LinkStatus {
        LinkStatus::from(self)
    }
}

/// User-facing connection status, derived purely from [`BridgeState`] flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LinkStatus {
    Stopped,
    WaitingForData,
    Connected,
}

impl From<&BridgeState> for LinkStatus {
    fn from(state: &BridgeState) -> Self {
        match (state.is_running, state.is_connected) {
            (false, _) => LinkStatus::Stopped,
            (true, false) => LinkStatus::WaitingForData,
            (true, true) => LinkStatus::Connected,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkStatus::Stopped => "stopped",
            LinkStatus::WaitingForData => "waiting for data",
            LinkStatus::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Lifecycle phase of a [`crate::Bridge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum BridgePhase {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for BridgePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BridgePhase::Stopped => "stopped",
            BridgePhase::Starting => "starting",
            BridgePhase::Running => "running",
            BridgePhase::Stopping => "stopping",
        };
        f.write_str(label)
    }
}
