//! The vedirect module contains the serial acquisition side of the bridge:
//! line codec, frame decoder, field registry and the port manager that drives
//! them from a character device.

pub mod codec;
pub mod frame;
pub mod registry;
pub mod schema;
pub mod serial;
pub mod serial_mock;

pub use codec::{parse_int, parse_onoff, parse_tagged_value, split_line};
pub use frame::{DecodeEvent, DecoderPhase, DecoderStats, FrameDecoder, FrameStatus};
pub use registry::{FieldDefinition, FieldRegistry, FieldType, FieldValue};
pub use schema::BMV_FIELDS;
pub use serial::{DeviceConnector, LineHandler, PortConfig, PortManager, PortStats, SerialConnector};
