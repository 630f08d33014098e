//! Actuator frame encoding
//!
//! Frames are newline-terminated ASCII lines of comma-separated decimals:
//!
//! ```text
//! minimal:  long,lat,vert\n
//! extended: long,lat,vert,throttle%,brake%,steering,susp_fl,susp_fr,susp_rl,susp_rr\n
//! ```
//!
//! G-forces use three decimals, input percentages one, suspension two.
//! There is no escaping, checksum or length prefix; the newline is the only
//! delimiter.

use std::fmt::{self, Write as _};

use crate::types::{GForces, PacketVariant, TelemetryRecord};

/// Encode one actuator frame into a fresh buffer.
pub fn encode(gforces: &GForces, record: &TelemetryRecord, variant: PacketVariant) -> Vec<u8> {
    let mut line = String::with_capacity(64);
    write_frame(&mut line, gforces, record, variant).ok();
    line.into_bytes()
}

/// Encode one actuator frame, replacing the contents of `buf`.
pub fn encode_into(
    buf: &mut String,
    gforces: &GForces,
    record: &TelemetryRecord,
    variant: PacketVariant,
) {
    buf.clear();
    write_frame(buf, gforces, record, variant).ok();
}

fn write_frame(
    out: &mut impl fmt::Write,
    gforces: &GForces,
    record: &TelemetryRecord,
    variant: PacketVariant,
) -> fmt::Result {
    write!(out, "{:.3},{:.3},{:.3}", gforces.longitudinal, gforces.lateral, gforces.vertical)?;

    if variant == PacketVariant::Extended {
        let inputs = record.inputs.unwrap_or_default();
        let suspension = record.suspension.unwrap_or_default().corners().map(finite_or_zero);

        write!(
            out,
            ",{:.1},{:.1},{},{:.2},{:.2},{:.2},{:.2}",
            inputs.throttle_percent(),
            inputs.brake_percent(),
            inputs.steering,
            suspension[0],
            suspension[1],
            suspension[2],
            suspension[3],
        )?;
    }

    out.write_char('\n')
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}
