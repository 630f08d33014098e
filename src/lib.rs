//! UDP to serial bridge for racing game motion platforms.
//!
//! Motionlink receives Forza "Data Out" telemetry over UDP, derives clamped
//! G-forces for a motion platform, and writes them to an actuator controller
//! over a serial link as compact text frames.
//!
//! # Features
//!
//! - **Bridge lifecycle**: start, stop, and restart with clean endpoint release
//! - **Snapshot state**: lock-free reads of the latest telemetry for UIs
//! - **Two frame variants**: G-forces only, or G-forces plus inputs and suspension
//! - **Pluggable endpoints**: any [`TelemetrySource`] and [`ActuatorLink`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use motionlink::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::load("motionlink.yaml")?;
//!     let mut bridge = Bridge::new();
//!     bridge.start(&config).await?;
//!
//!     let mut handle = bridge.state();
//!     while let Some(state) = handle.changed().await {
//!         println!("{} packets, {:+.2} G", state.packet_count, state.last_gforces.longitudinal);
//!     }
//!
//!     bridge.stop().await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Per-packet processing
pub mod decoder;
pub mod encoder;
pub mod motion;
pub mod pipeline;

// Endpoints and lifecycle
pub mod bridge;
pub mod config;
pub mod endpoint;
pub mod endpoints;
pub mod status;

// Core exports
pub use error::*;
pub use types::*;

pub use bridge::{Bridge, StateHandle};
pub use config::{BridgeConfig, ReceiveMode, ReceiverConfig, SerialConfig};
pub use decoder::decode;
pub use encoder::encode;
pub use endpoint::{ActuatorLink, TelemetrySource};
pub use endpoints::{SerialLink, UdpReceiver};
pub use motion::{Motion, derive};
pub use pipeline::Pipeline;
pub use status::{StatusReporter, status_line};
