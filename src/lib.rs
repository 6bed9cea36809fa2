//! # vedirect-bridge - VE.Direct to CAN telemetry bridge
//!
//! The vedirect-bridge crate reads the VE.Direct text protocol spoken by Victron battery
//! monitors and chargers over a serial line, validates every frame by its checksum and
//! republishes the battery values as telemetry messages.
//!
//! ## Features
//!
//! - Byte-at-a-time frame decoder with checksum validation and overrun recovery
//! - Schema-driven field registry with per-field arrival timestamps
//! - Self-healing serial port manager: reconnect with backoff, inactivity detection,
//!   live baud-rate and device changes
//! - Battery monitor glue turning valid frames into battery and battery-status messages
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! vedirect-bridge = "0.1.0"
//! ```
//!
//! ```rust
//! use vedirect_bridge::{
//!     FieldRegistry, FrameDecoder, DecodeEvent, VeDirectError, init_logger_with_level, BMV_FIELDS,
//! };
//! ```

pub mod battery_monitor;
pub mod constants;
pub mod error;
pub mod logging;
pub mod util;
pub mod vedirect;

pub use crate::error::VeDirectError;
pub use crate::logging::{init_logger_with_level, log_info};

// Acquisition side
pub use vedirect::{
    DecodeEvent, DecoderPhase, DeviceConnector, FieldDefinition, FieldRegistry, FieldType,
    FieldValue, FrameDecoder, FrameStatus, LineHandler, PortConfig, PortManager, PortStats,
    SerialConnector, BMV_FIELDS,
};

// Consumer side
pub use battery_monitor::{
    BatteryMonitor, BatterySnapshot, FrameHarvester, LogSink, MonitorConfig, TelemetrySink,
};
