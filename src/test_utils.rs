//! Test utilities: synthetic packets and in-memory endpoints
//!
//! This module provides a builder for telemetry datagrams plus scripted
//! source and recording link implementations, so the bridge can be
//! exercised without a game or a serial device.

#![cfg(any(test, feature = "benchmark"))]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::endpoint::{ActuatorLink, TelemetrySource};
use crate::types::{
    ACCEL_LATERAL_INDEX, ACCEL_LONGITUDINAL_INDEX, ACCEL_VERTICAL_INDEX, FLOAT_SIZE,
    MIN_PACKET_SIZE, PacketLayout, RPM_INDEX, VELOCITY_X_INDEX, VELOCITY_Y_INDEX,
    VELOCITY_Z_INDEX,
};
use crate::{BridgeError, Result};

/// Builds telemetry datagrams with chosen field values.
///
/// Extended fields are written at the offsets of [`PacketLayout::extended`].
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    bytes: Vec<u8>,
    layout: PacketLayout,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self { bytes: vec![0u8; MIN_PACKET_SIZE], layout: PacketLayout::extended() }
    }

    pub fn rpm(self, rpm: f32) -> Self {
        self.float(RPM_INDEX, rpm)
    }

    pub fn accel(self, lateral: f32, vertical: f32, longitudinal: f32) -> Self {
        self.float(ACCEL_LATERAL_INDEX, lateral)
            .float(ACCEL_VERTICAL_INDEX, vertical)
            .float(ACCEL_LONGITUDINAL_INDEX, longitudinal)
    }

    pub fn velocity(self, x: f32, y: f32, z: f32) -> Self {
        self.float(VELOCITY_X_INDEX, x).float(VELOCITY_Y_INDEX, y).float(VELOCITY_Z_INDEX, z)
    }

    pub fn suspension(self, fl: f32, fr: f32, rl: f32, rr: f32) -> Self {
        let first = self.layout.suspension_index;
        self.float(first, fl).float(first + 1, fr).float(first + 2, rl).float(first + 3, rr)
    }

    pub fn inputs(mut self, throttle: u8, brake: u8, steering: i8) -> Self {
        let (t, b, s) =
            (self.layout.throttle_offset, self.layout.brake_offset, self.layout.steering_offset);
        self.bytes[t] = throttle;
        self.bytes[b] = brake;
        self.bytes[s] = steering.to_le_bytes()[0];
        self
    }

    /// Resize the datagram, zero-filling any growth.
    pub fn len(mut self, len: usize) -> Self {
        self.bytes.resize(len, 0);
        self
    }

    /// Write a float at `index` of the leading float array.
    pub fn float(mut self, index: usize, value: f32) -> Self {
        let start = index * FLOAT_SIZE;
        self.bytes[start..start + FLOAT_SIZE].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Ordered record of endpoint lifecycle events shared between test endpoints.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<&'static str>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: &'static str) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.lock().iter().filter(|e| **e == event).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<&'static str>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub const SOURCE_CLOSED: &str = "source closed";
pub const LINK_CLOSED: &str = "link closed";

/// Telemetry source fed from a channel.
///
/// Each call to [`TelemetrySource::receive`] yields the next fed datagram or
/// injected socket error, or times out. Every `close` call is logged, so
/// double closes are visible.
pub struct ScriptedSource {
    rx: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
    current: Vec<u8>,
    timeout: Duration,
    events: EventLog,
}

/// Sending half of a [`ScriptedSource`].
#[derive(Debug, Clone)]
pub struct SourceFeed(mpsc::UnboundedSender<io::Result<Vec<u8>>>);

impl SourceFeed {
    /// Queue a datagram. Returns false once the source is gone.
    pub fn send(&self, datagram: Vec<u8>) -> bool {
        self.0.send(Ok(datagram)).is_ok()
    }

    /// Queue a socket error, surfaced as [`BridgeError::Receive`].
    pub fn fail(&self, kind: io::ErrorKind) -> bool {
        self.0.send(Err(kind.into())).is_ok()
    }
}

impl ScriptedSource {
    pub fn new(timeout: Duration, events: &EventLog) -> (Self, SourceFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self { rx, current: Vec::new(), timeout, events: events.clone() };
        (source, SourceFeed(tx))
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ScriptedSource {
    async fn receive(&mut self) -> Result<&[u8]> {
        match tokio::time::timeout(self.timeout, self.rx.recv()).await {
            Ok(Some(Ok(datagram))) => {
                self.current = datagram;
                Ok(&self.current)
            }
            Ok(Some(Err(source))) => Err(BridgeError::Receive { source }),
            Ok(None) => {
                // Feed dropped: behave like a silent network
                tokio::time::sleep(self.timeout).await;
                Err(BridgeError::Timeout { duration: self.timeout })
            }
            Err(_) => Err(BridgeError::Timeout { duration: self.timeout }),
        }
    }

    fn close(&mut self) {
        self.events.push(SOURCE_CLOSED);
    }
}

/// Actuator link that records frames in memory.
pub struct RecordingLink {
    probe: LinkProbe,
    events: EventLog,
}

/// Inspection and fault-injection side of a [`RecordingLink`].
#[derive(Debug, Clone, Default)]
pub struct LinkProbe {
    frames: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl LinkProbe {
    /// Frames accepted so far, as text.
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RecordingLink {
    pub fn new(events: &EventLog) -> (Self, LinkProbe) {
        let probe = LinkProbe::default();
        (Self { probe: probe.clone(), events: events.clone() }, probe)
    }
}

#[async_trait::async_trait]
impl ActuatorLink for RecordingLink {
    async fn write(&mut self, frame: &[u8]) -> bool {
        self.probe.attempts.fetch_add(1, Ordering::SeqCst);
        if self.probe.failing.load(Ordering::SeqCst) {
            return false;
        }
        let text = String::from_utf8_lossy(frame).into_owned();
        self.probe.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(text);
        true
    }

    fn close(&mut self) {
        self.events.push(LINK_CLOSED);
    }
}
