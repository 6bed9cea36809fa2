//! # VE.Direct Error Handling
//!
//! This module defines the VeDirectError enum, which represents the different error
//! types that can occur in the vedirect-bridge crate.
//!
//! Most failures inside the acquisition loop never surface as an error: the port
//! manager recovers from them locally. These variants describe what the fallible
//! building blocks (device open, registry accessors, configuration) report.

use thiserror::Error;

/// Represents the different error types that can occur in the VE.Direct crate.
#[derive(Debug, Error)]
pub enum VeDirectError {
    /// The character device could not be opened.
    #[error("Device {port} unavailable: {reason}")]
    DeviceUnavailable { port: String, reason: String },

    /// A field index outside the registry schema was requested.
    #[error("Invalid field index: {0}")]
    InvalidIndex(usize),

    /// A field was read with an accessor that does not match its declared type.
    #[error("Field {tag} is not a {expected} field")]
    FieldTypeMismatch { tag: &'static str, expected: &'static str },

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A telemetry message could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
