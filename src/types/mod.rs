//! Core data types flowing through the bridge

mod gforces;
mod layout;
mod state;
mod telemetry;

pub use gforces::{GForces, unix_millis};
pub use layout::*;
pub use state::{BridgePhase, BridgeState, LinkStatus};
pub use telemetry::{DriverInputs, MS_TO_KMH, MS_TO_MPH, SuspensionTravel, TelemetryRecord};
