//! G-force values sent to the motion platform

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Three-axis acceleration in multiples of standard gravity.
///
/// Axis values are already clamped to their actuator-safe range and rounded
/// to three decimal places when produced by [`crate::motion::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct GForces {
    /// Positive under braking
    pub longitudinal: f64,
    pub lateral: f64,
    /// 1.0 at rest (gravity only)
    pub vertical: f64,
    /// Wall-clock milliseconds since the Unix epoch at computation time
    pub timestamp_ms: i64,
}

impl GForces {
    /// Resting frame: gravity only, no lateral or longitudinal load.
    pub fn neutral(timestamp_ms: i64) -> Self {
        Self { longitudinal: 0.0, lateral: 0.0, vertical: 1.0, timestamp_ms }
    }

    /// True when all three axes equal the resting frame.
    pub fn is_neutral(&self) -> bool {
        self.longitudinal == 0.0 && self.lateral == 0.0 && self.vertical == 1.0
    }
}

impl Default for GForces {
    fn default() -> Self {
        Self::neutral(0)
    }
}

/// Current wall-clock time in Unix milliseconds.
///
/// A clock set before the epoch yields 0.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
