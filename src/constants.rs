//! VE.Direct Protocol Constants
//!
//! Wire-format markers of the VE.Direct text protocol and the timing defaults
//! used by the port manager.

/// Carriage return, first byte of the line terminator
pub const VEDIRECT_CR: u8 = 0x0D;

/// Line feed, second byte of the line terminator
pub const VEDIRECT_LF: u8 = 0x0A;

/// Separator between tag and value on a line
pub const VEDIRECT_TAB: u8 = b'\t';

/// Trailer that closes every frame; exactly one checksum byte follows it
pub const VEDIRECT_CHECKSUM_MARKER: &[u8] = b"Checksum\t";

/// Synthetic line handed to the line handler once a frame checksum is valid
pub const END_OF_FRAME_LINE: &str = "Checksum\t";

/// Token used on the wire for "value currently undefined"
pub const UNDEFINED_TOKEN: &str = "---";

/// Token decoded as boolean `true`
pub const ON_TOKEN: &str = "ON";

// ----------------------------------------------------------------------------
// Port defaults
// ----------------------------------------------------------------------------

/// Baud rate of a VE.Direct port
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Decoder buffer size; one full frame must fit
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Silence on an open port longer than this closes it (ms)
pub const INACTIVITY_TIMEOUT_MS: u64 = 2000;

/// Pause between two failed open attempts (ms)
pub const RECONNECT_BACKOFF_MS: u64 = 1000;

/// Period of the byte-count statistics trace (ms)
pub const STATS_INTERVAL_MS: u64 = 10000;

/// Bytes pulled from the device per read call
pub const READ_CHUNK_SIZE: usize = 64;
