//! G-force derivation and activity classification

use crate::types::{GForces, MS_TO_KMH, TelemetryRecord, unix_millis};

/// Standard gravity used for all G conversions (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Speed above which the vehicle counts as moving (km/h, exclusive).
pub const ACTIVE_SPEED_KMH: f64 = 1.0;

/// Engine speed above which the vehicle counts as active (exclusive).
pub const ACTIVE_RPM: f64 = 1000.0;

/// Actuator-safe limits per axis, in G.
pub const LONGITUDINAL_RANGE: (f64, f64) = (-3.0, 3.0);
pub const LATERAL_RANGE: (f64, f64) = (-3.0, 3.0);
pub const VERTICAL_RANGE: (f64, f64) = (-1.0, 4.0);

/// Result of deriving motion from one telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub gforces: GForces,
    pub is_active: bool,
    pub speed_ms: f64,
}

/// Derive G-forces and activity from a record, stamped with the current time.
pub fn derive(record: &TelemetryRecord) -> Motion {
    derive_at(record, unix_millis())
}

/// Derive G-forces and activity with an explicit timestamp.
///
/// An idle vehicle always yields the neutral frame so accelerometer noise at
/// standstill never reaches the actuators.
pub fn derive_at(record: &TelemetryRecord, timestamp_ms: i64) -> Motion {
    let speed_ms = record.speed_ms();
    let is_active = is_active(speed_ms, f64::from(record.engine_rpm));

    let gforces = if is_active {
        GForces {
            longitudinal: axis(
                -f64::from(record.accel_longitudinal) / STANDARD_GRAVITY,
                0.0,
                LONGITUDINAL_RANGE,
            ),
            lateral: axis(f64::from(record.accel_lateral) / STANDARD_GRAVITY, 0.0, LATERAL_RANGE),
            vertical: axis(
                f64::from(record.accel_vertical) / STANDARD_GRAVITY + 1.0,
                1.0,
                VERTICAL_RANGE,
            ),
            timestamp_ms,
        }
    } else {
        GForces::neutral(timestamp_ms)
    };

    Motion { gforces, is_active, speed_ms }
}

/// Moving faster than 1 km/h or revving above idle. Both bounds are strict.
pub fn is_active(speed_ms: f64, engine_rpm: f64) -> bool {
    speed_ms * MS_TO_KMH > ACTIVE_SPEED_KMH || engine_rpm > ACTIVE_RPM
}

/// Clamp and round one axis. NaN becomes the axis's resting value.
fn axis(value: f64, resting: f64, (min, max): (f64, f64)) -> f64 {
    let value = if value.is_nan() { resting } else { value };
    round3(value.clamp(min, max))
}

/// Round half away from zero at the third decimal; -0.0 becomes 0.0.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}
