//! Error types for the telemetry bridge.
//!
//! Errors are split by where they stop the bridge:
//!
//! ## Error Categories
//!
//! - **Resource Errors**: binding the UDP endpoint or opening the serial device.
//!   These abort a start attempt and leave the bridge stopped.
//! - **Configuration Errors**: invalid values, unreadable or malformed config files
//! - **Transient Errors**: receive timeouts and socket receive failures. The
//!   processing loop absorbs these and keeps running.
//! - **Lifecycle Errors**: start while already running, task join failures
//!
//! ## Recovery
//!
//! ```rust
//! use motionlink::BridgeError;
//!
//! let error = BridgeError::config("baud_rate", "must be greater than zero");
//! if !error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Failed to bind UDP endpoint {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open serial device {device}")]
    SerialOpen {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Invalid configuration for '{field}': {details}")]
    Config { field: String, details: String },

    #[error("Config file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error")]
    ConfigParse {
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("No telemetry received within {duration:?}")]
    Timeout { duration: Duration },

    #[error("UDP receive failed")]
    Receive {
        #[source]
        source: std::io::Error,
    },

    #[error("Bridge is already {phase}")]
    AlreadyRunning { phase: String },

    #[error("Bridge task failed: {details}")]
    Task { details: String },
}

impl BridgeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Bind { .. } => true,
            BridgeError::SerialOpen { .. } => true,
            BridgeError::Timeout { .. } => true,
            BridgeError::Receive { .. } => true,
            BridgeError::Config { .. } => false,
            BridgeError::ConfigFile { .. } => false,
            BridgeError::ConfigParse { .. } => false,
            BridgeError::AlreadyRunning { .. } => false,
            BridgeError::Task { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Bind { .. } => vec![
                "Close other instances or applications using this UDP port",
                "Check the listen address is assigned to this machine",
                "Match the port to the game's Data Out IP Port setting",
            ],
            BridgeError::SerialOpen { .. } => vec![
                "Ensure the controller is plugged in",
                "Check the serial device name (e.g. COM6 or /dev/ttyACM0)",
                "Close serial monitors that hold the port open",
                "Verify USB serial drivers are installed",
            ],
            BridgeError::Config { .. } => vec![
                "Check the value against the documented range",
                "Remove the field to fall back to its default",
            ],
            BridgeError::ConfigFile { .. } => vec![
                "Check the config file exists and is readable",
                "Check file permissions",
            ],
            BridgeError::ConfigParse { .. } => vec![
                "Check the YAML syntax of the config file",
                "Compare field names against the documented config keys",
            ],
            BridgeError::Timeout { .. } => vec![
                "Enable Data Out in the game's HUD and Gameplay settings",
                "Match the Data Out IP address and port to the bridge config",
                "Start driving so the game emits packets",
            ],
            BridgeError::Receive { .. } => vec![
                "Check network adapter state",
                "Restart the bridge",
            ],
            BridgeError::AlreadyRunning { .. } => vec!["Stop the bridge before starting it again"],
            BridgeError::Task { .. } => {
                vec!["Restart the bridge", "Report the failure with debug logs attached"]
            }
        }
    }

    /// Helper constructor for UDP bind errors.
    pub fn bind_failed(address: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::Bind { address: address.into(), source }
    }

    /// Helper constructor for serial open errors.
    pub fn serial_open_failed(device: impl Into<String>, source: serialport::Error) -> Self {
        BridgeError::SerialOpen { device: device.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(field: impl Into<String>, details: impl Into<String>) -> Self {
        BridgeError::Config { field: field.into(), details: details.into() }
    }

    /// Helper constructor for config file errors with path context.
    pub fn config_file(path: PathBuf, source: std::io::Error) -> Self {
        BridgeError::ConfigFile { path, source }
    }

    /// Helper constructor for task failures.
    pub fn task_failed(details: impl Into<String>) -> Self {
        BridgeError::Task { details: details.into() }
    }

    /// True for the "no data this tick" outcome of a receive.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}

impl From<serde_yaml_ng::Error> for BridgeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        BridgeError::ConfigParse { source: err }
    }
}
