//! UDP telemetry receiver

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::config::{ReceiveMode, ReceiverConfig};
use crate::endpoint::TelemetrySource;
use crate::types::MAX_PACKET_SIZE;
use crate::{BridgeError, Result};

/// Largest datagram accepted; longer datagrams are truncated by the OS.
pub const MAX_DATAGRAM_SIZE: usize = MAX_PACKET_SIZE;

/// Receiver bound to the configured listen address.
///
/// The bind is exclusive: a second bridge on the same port fails to start
/// instead of silently sharing the stream.
pub struct UdpReceiver {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
    mode: ReceiveMode,
    timeout: Duration,
    poll_interval: Duration,
    buf: Box<[u8; MAX_DATAGRAM_SIZE]>,
}

impl UdpReceiver {
    /// Bind the listen socket.
    pub async fn bind(config: &ReceiverConfig) -> Result<Self> {
        let addr = config.socket_addr()?;
        let socket =
            UdpSocket::bind(addr).await.map_err(|e| BridgeError::bind_failed(addr.to_string(), e))?;
        let local_addr =
            socket.local_addr().map_err(|e| BridgeError::bind_failed(addr.to_string(), e))?;

        info!("Listening for telemetry on udp://{} ({:?} mode)", local_addr, config.mode);

        Ok(Self {
            socket: Some(socket),
            local_addr,
            mode: config.mode,
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            buf: Box::new([0u8; MAX_DATAGRAM_SIZE]),
        })
    }

    pub fn mode(&self) -> ReceiveMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn closed_error() -> BridgeError {
        BridgeError::Receive {
            source: std::io::Error::new(std::io::ErrorKind::NotConnected, "receiver closed"),
        }
    }
}

#[async_trait::async_trait]
impl TelemetrySource for UdpReceiver {
    async fn receive(&mut self) -> Result<&[u8]> {
        let socket = self.socket.as_ref().ok_or_else(Self::closed_error)?;
        let buf = &mut self.buf[..];

        let (len, from) = match self.mode {
            ReceiveMode::Blocking => {
                match tokio::time::timeout(self.timeout, socket.recv_from(buf)).await {
                    Ok(result) => result.map_err(|source| BridgeError::Receive { source })?,
                    Err(_) => return Err(BridgeError::Timeout { duration: self.timeout }),
                }
            }
            ReceiveMode::Polling => {
                let deadline = Instant::now() + self.timeout;
                loop {
                    match socket.try_recv_from(buf) {
                        Ok(received) => break received,
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                            if Instant::now() >= deadline {
                                return Err(BridgeError::Timeout { duration: self.timeout });
                            }
                            tokio::time::sleep(self.poll_interval).await;
                        }
                        Err(source) => return Err(BridgeError::Receive { source }),
                    }
                }
            }
        };

        trace!("Received {} bytes from {}", len, from);
        Ok(&self.buf[..len])
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().map(|_| self.local_addr)
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Closed UDP receiver on {}", self.local_addr);
        }
    }
}
