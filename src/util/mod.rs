//! # Utility Modules
//!
//! Clock, hex rendering and logging helpers shared by the decoder and the
//! port manager.

pub mod clock;
pub mod hex;
pub mod logging;

pub use clock::{sleep_ms, Clock};
pub use hex::{format_hex_compact, pretty_hex};
pub use logging::{log_frame_hex, LogThrottle};
