//! Concrete endpoint implementations

pub mod serial;
pub mod udp;

pub use serial::SerialLink;
pub use udp::{MAX_DATAGRAM_SIZE, UdpReceiver};
