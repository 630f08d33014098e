//! Per-packet processing: decode, derive, encode

use crate::decoder;
use crate::encoder;
use crate::motion::{self, Motion};
use crate::types::{PacketLayout, TelemetryRecord};

/// Everything produced from one accepted datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed<'a> {
    pub record: TelemetryRecord,
    pub motion: Motion,
    /// Encoded actuator frame, borrowed from the pipeline's buffer
    pub frame: &'a [u8],
}

/// Stateless apart from a reusable frame buffer.
#[derive(Debug, Clone)]
pub struct Pipeline {
    layout: PacketLayout,
    frame: String,
}

impl Pipeline {
    pub fn new(layout: PacketLayout) -> Self {
        Self { layout, frame: String::with_capacity(64) }
    }

    pub fn layout(&self) -> &PacketLayout {
        &self.layout
    }

    /// Run one datagram through the pipeline. `None` means the datagram was dropped.
    pub fn process(&mut self, datagram: &[u8]) -> Option<Processed<'_>> {
        let record = decoder::decode(datagram, &self.layout)?;
        let motion = motion::derive(&record);
        encoder::encode_into(&mut self.frame, &motion.gforces, &record, self.layout.variant);

        Some(Processed { record, motion, frame: self.frame.as_bytes() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PacketBuilder;

    #[test]
    fn active_packet_produces_derived_frame() {
        let mut pipeline = Pipeline::new(PacketLayout::minimal());
        let packet = PacketBuilder::new()
            .rpm(5000.0)
            .accel(9.81, 0.0, -19.62)
            .velocity(0.0, 0.0, 25.0)
            .build();

        let processed = pipeline.process(&packet).unwrap();

        assert!(processed.motion.is_active);
        assert_eq!(processed.frame, b"2.000,1.000,1.000\n");
        assert_eq!(processed.record.engine_rpm, 5000.0);
    }

    #[test]
    fn idle_packet_produces_neutral_frame() {
        let mut pipeline = Pipeline::new(PacketLayout::minimal());
        let packet = PacketBuilder::new().rpm(700.0).accel(3.0, 3.0, 3.0).build();

        let processed = pipeline.process(&packet).unwrap();

        assert!(!processed.motion.is_active);
        assert_eq!(processed.frame, b"0.000,0.000,1.000\n");
    }

    #[test]
    fn extended_layout_appends_inputs() {
        let mut pipeline = Pipeline::new(PacketLayout::extended());
        let packet = PacketBuilder::new()
            .rpm(700.0)
            .inputs(0, 255, 7)
            .suspension(0.5, 0.5, 0.5, 0.5)
            .build();

        let processed = pipeline.process(&packet).unwrap();

        assert_eq!(processed.frame, b"0.000,0.000,1.000,0.0,100.0,7,0.50,0.50,0.50,0.50\n");
    }

    #[test]
    fn short_datagram_is_dropped() {
        let mut pipeline = Pipeline::new(PacketLayout::minimal());
        assert!(pipeline.process(&[0u8; 100]).is_none());
    }
}
