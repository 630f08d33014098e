//! Endpoint traits for the two ends of the bridge

use std::net::SocketAddr;

use crate::Result;

/// Inbound telemetry endpoint.
///
/// Sources are owned exclusively by the processing task, so implementations
/// need no internal locking.
#[async_trait::async_trait]
pub trait TelemetrySource: Send + 'static {
    /// Wait for the next datagram.
    ///
    /// Returns:
    /// - `Ok(bytes)` - a datagram arrived; the slice is valid until the next call
    /// - `Err(BridgeError::Timeout)` - nothing arrived within the receive timeout
    /// - `Err(e)` - the socket reported an error
    async fn receive(&mut self) -> Result<&[u8]>;

    /// Address the source listens on, if bound.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Release the endpoint. Calling it again is a no-op.
    fn close(&mut self) {}
}

/// Outbound actuator endpoint.
#[async_trait::async_trait]
pub trait ActuatorLink: Send + 'static {
    /// Write one encoded frame.
    ///
    /// Returns true iff every byte was accepted within the write timeout.
    /// Failures are reported, never raised; callers keep writing later frames.
    async fn write(&mut self, frame: &[u8]) -> bool;

    /// Release the link. Calling it again is a no-op.
    fn close(&mut self) {}
}
