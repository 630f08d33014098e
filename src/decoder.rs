//! Telemetry packet decoding
//!
//! Datagrams start with 77 little-endian `f32` values. The decoder reads the
//! engine, acceleration and velocity fields from that array and, for the
//! extended layout, the suspension floats and raw driver-input bytes.
//!
//! Decoding never allocates and keeps no state between calls. Field values
//! are not range-checked: a corrupt RPM or a NaN acceleration is returned
//! as-is.

use crate::types::{
    ACCEL_LATERAL_INDEX, ACCEL_LONGITUDINAL_INDEX, ACCEL_VERTICAL_INDEX, DriverInputs, FLOAT_SIZE,
    MIN_PACKET_SIZE, PacketLayout, RPM_INDEX, SuspensionTravel, TelemetryRecord, VELOCITY_X_INDEX,
    VELOCITY_Y_INDEX, VELOCITY_Z_INDEX,
};

/// Decode one datagram.
///
/// Returns `None` for datagrams shorter than [`MIN_PACKET_SIZE`]. Extended
/// fields are left `None` when the layout is minimal or the datagram is
/// shorter than [`PacketLayout::required_len`].
pub fn decode(bytes: &[u8], layout: &PacketLayout) -> Option<TelemetryRecord> {
    if bytes.len() < MIN_PACKET_SIZE {
        return None;
    }

    let mut record = TelemetryRecord {
        engine_rpm: read_float(bytes, RPM_INDEX)?,
        accel_lateral: read_float(bytes, ACCEL_LATERAL_INDEX)?,
        accel_vertical: read_float(bytes, ACCEL_VERTICAL_INDEX)?,
        accel_longitudinal: read_float(bytes, ACCEL_LONGITUDINAL_INDEX)?,
        velocity_x: read_float(bytes, VELOCITY_X_INDEX)?,
        velocity_y: read_float(bytes, VELOCITY_Y_INDEX)?,
        velocity_z: read_float(bytes, VELOCITY_Z_INDEX)?,
        inputs: None,
        suspension: None,
    };

    if layout.is_extended() && bytes.len() >= layout.required_len() {
        record.suspension = read_suspension(bytes, layout.suspension_index);
        record.inputs = read_inputs(bytes, layout);
    }

    Some(record)
}

/// Read the float at `index` of the leading float array.
fn read_float(bytes: &[u8], index: usize) -> Option<f32> {
    let start = index.checked_mul(FLOAT_SIZE)?;
    let end = start.checked_add(FLOAT_SIZE)?;
    let raw: [u8; FLOAT_SIZE] = bytes.get(start..end)?.try_into().ok()?;
    Some(f32::from_le_bytes(raw))
}

fn read_suspension(bytes: &[u8], first: usize) -> Option<SuspensionTravel> {
    Some(SuspensionTravel {
        front_left: read_float(bytes, first)?,
        front_right: read_float(bytes, first.checked_add(1)?)?,
        rear_left: read_float(bytes, first.checked_add(2)?)?,
        rear_right: read_float(bytes, first.checked_add(3)?)?,
    })
}

fn read_inputs(bytes: &[u8], layout: &PacketLayout) -> Option<DriverInputs> {
    Some(DriverInputs {
        throttle: *bytes.get(layout.throttle_offset)?,
        brake: *bytes.get(layout.brake_offset)?,
        steering: i8::from_le_bytes([*bytes.get(layout.steering_offset)?]),
    })
}
