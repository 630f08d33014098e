//! Packet layout description

use serde::{Deserialize, Serialize};

use crate::{BridgeError, Result};

/// Size of one packed little-endian float field.
pub const FLOAT_SIZE: usize = 4;

/// Number of leading floats in every packet.
pub const FLOAT_COUNT: usize = 77;

/// Shortest datagram accepted by the decoder (77 floats).
pub const MIN_PACKET_SIZE: usize = FLOAT_COUNT * FLOAT_SIZE;

/// Largest datagram the receiver accepts; every layout offset must fit inside it.
pub const MAX_PACKET_SIZE: usize = 1024;

/// Float indices of the fields present in every layout.
pub const RPM_INDEX: usize = 4;
pub const ACCEL_LATERAL_INDEX: usize = 5;
pub const ACCEL_VERTICAL_INDEX: usize = 6;
pub const ACCEL_LONGITUDINAL_INDEX: usize = 7;
pub const VELOCITY_X_INDEX: usize = 8;
pub const VELOCITY_Y_INDEX: usize = 9;
pub const VELOCITY_Z_INDEX: usize = 10;

/// Which fields are decoded and which frame shape is sent downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PacketVariant {
    /// G-forces only: `long,lat,vert`
    #[default]
    Minimal,
    /// G-forces plus driver inputs and suspension travel
    Extended,
}

/// Field positions inside a telemetry datagram.
///
/// The actuator byte offsets vary between game builds, so they are data
/// rather than constants. Defaults match the Car Dash packet as observed with
/// Forza Horizon 4/5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketLayout {
    pub variant: PacketVariant,

    /// Float index of front-left suspension travel; FR, RL, RR follow
    pub suspension_index: usize,

    /// Byte offsets from packet start
    pub throttle_offset: usize,
    pub brake_offset: usize,
    pub steering_offset: usize,
}

impl Default for PacketLayout {
    fn default() -> Self {
        Self {
            variant: PacketVariant::Minimal,
            suspension_index: 17,
            throttle_offset: 232,
            brake_offset: 233,
            steering_offset: 236,
        }
    }
}

impl PacketLayout {
    /// Default offsets with only the G-force fields decoded.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Default offsets with inputs and suspension decoded.
    pub fn extended() -> Self {
        Self { variant: PacketVariant::Extended, ..Self::default() }
    }

    pub fn is_extended(&self) -> bool {
        self.variant == PacketVariant::Extended
    }

    /// Minimum datagram length at which the extended fields can be read.
    ///
    /// Saturates at `usize::MAX` for offsets no datagram can reach.
    pub fn required_len(&self) -> usize {
        let suspension_end = self.suspension_index.saturating_add(4).saturating_mul(FLOAT_SIZE);
        let last_byte =
            self.throttle_offset.max(self.brake_offset).max(self.steering_offset).saturating_add(1);
        MIN_PACKET_SIZE.max(suspension_end).max(last_byte)
    }

    /// Reject offsets that fall outside [`MAX_PACKET_SIZE`].
    pub fn validate(&self) -> Result<()> {
        let required = self.required_len();
        if required > MAX_PACKET_SIZE {
            return Err(BridgeError::config(
                "packet",
                format!(
                    "offsets need {} bytes but datagrams are at most {} bytes",
                    required, MAX_PACKET_SIZE
                ),
            ));
        }
        Ok(())
    }
}
