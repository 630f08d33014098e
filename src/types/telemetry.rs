//! Decoded telemetry records

use serde::{Deserialize, Serialize};

/// Meters per second to miles per hour.
pub const MS_TO_MPH: f64 = 2.23694;

/// Meters per second to kilometers per hour.
pub const MS_TO_KMH: f64 = 3.6;

/// One decoded telemetry packet.
///
/// Created fresh per datagram and never mutated after decode. Fields carry
/// whatever the simulator sent, including NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryRecord {
    /// Current engine speed
    pub engine_rpm: f32,

    /// Sensor-frame linear accelerations in m/s²
    pub accel_lateral: f32,
    pub accel_vertical: f32,
    pub accel_longitudinal: f32,

    /// Velocity components in m/s
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub velocity_z: f32,

    /// Pedal and steering inputs, extended layout only
    pub inputs: Option<DriverInputs>,

    /// Normalized suspension travel, extended layout only
    pub suspension: Option<SuspensionTravel>,
}

impl TelemetryRecord {
    /// Euclidean norm of the velocity vector in m/s.
    pub fn speed_ms(&self) -> f64 {
        let vx = f64::from(self.velocity_x);
        let vy = f64::from(self.velocity_y);
        let vz = f64::from(self.velocity_z);
        (vx * vx + vy * vy + vz * vz).sqrt()
    }

    pub fn speed_mph(&self) -> f64 {
        self.speed_ms() * MS_TO_MPH
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_ms() * MS_TO_KMH
    }
}

/// Raw driver inputs as emitted in the packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverInputs {
    /// 0-255
    pub throttle: u8,
    /// 0-255
    pub brake: u8,
    pub steering: i8,
}

impl DriverInputs {
    pub fn throttle_percent(&self) -> f64 {
        byte_percent(self.throttle)
    }

    pub fn brake_percent(&self) -> f64 {
        byte_percent(self.brake)
    }
}

fn byte_percent(value: u8) -> f64 {
    f64::from(value) / 255.0 * 100.0
}

/// Normalized suspension travel per corner (0.0 = fully extended, 1.0 = fully compressed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SuspensionTravel {
    pub front_left: f32,
    pub front_right: f32,
    pub rear_left: f32,
    pub rear_right: f32,
}

impl SuspensionTravel {
    /// Corners in wire order: FL, FR, RL, RR.
    pub fn corners(&self) -> [f32; 4] {
        [self.front_left, self.front_right, self.rear_left, self.rear_right]
    }
}
