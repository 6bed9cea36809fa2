//! # VE.Direct Frame Decoder
//!
//! Byte-at-a-time state machine that turns the raw character stream of a
//! VE.Direct port into logical lines and checksum-verified frames.
//!
//! A frame on the wire looks like
//!
//! ```text
//! \r\nPID\t0xA381\r\nV\t12488\r\n ... \r\nChecksum\t<byte>
//! ```
//!
//! The `Checksum` trailer is the only frame delimiter: there is no start
//! marker, so after power-up or corruption the decoder simply waits for the
//! next `CRLF` and lets the first (partial) frame fail its checksum. The sum of
//! every byte of a frame, the checksum byte included, is `0` modulo 256.
//!
//! ## Usage
//!
//! ```rust
//! use vedirect_bridge::vedirect::frame::{DecodeEvent, FrameDecoder, FrameStatus};
//!
//! let mut decoder = FrameDecoder::default();
//! let mut body = b"\r\nV\t12488\r\nChecksum\t".to_vec();
//! let sum = body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
//! body.push(0u8.wrapping_sub(sum));
//!
//! let events: Vec<DecodeEvent> = body.iter().map(|&b| decoder.process_byte(b)).collect();
//! assert!(events.contains(&DecodeEvent::LineReady("V\t12488".to_string())));
//! assert_eq!(events.last(), Some(&DecodeEvent::FrameComplete(FrameStatus::Valid)));
//! ```

use crate::constants::{DEFAULT_BUFFER_CAPACITY, VEDIRECT_CHECKSUM_MARKER, VEDIRECT_CR, VEDIRECT_LF};
use crate::util::logging::{log_frame_hex, LogThrottle};
use bytes::BytesMut;

/// Where the decoder is relative to frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    /// No line boundary seen since the last reset
    Idle,
    /// Inside a frame; complete lines are emitted as they arrive
    InFrame,
}

/// Verdict on a frame whose `Checksum` trailer has been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Byte sum is zero; the frame's lines may be used
    Valid,
    /// Byte sum is non-zero; the frame must be dropped
    ChecksumMismatch { sum: u8 },
}

/// Result of feeding one byte to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Nothing to report yet
    Continue,
    /// A full `TAG<TAB>VALUE` line, terminator stripped
    LineReady(String),
    /// The checksum byte arrived; decoder state has been reset
    FrameComplete(FrameStatus),
}

/// Running totals, kept across resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_valid: u64,
    pub frames_invalid: u64,
    pub overruns: u64,
    pub lines: u64,
}

/// Incremental VE.Direct frame decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    phase: DecoderPhase,
    buffer: BytesMut,
    capacity: usize,
    checksum: u8,
    /// Offset in `buffer` where the current line starts
    line_start: usize,
    stats: DecoderStats,
    corruption_log: LogThrottle,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl FrameDecoder {
    /// Create a decoder whose buffer holds at most `capacity` bytes of one frame.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(VEDIRECT_CHECKSUM_MARKER.len() + 1);
        FrameDecoder {
            phase: DecoderPhase::Idle,
            buffer: BytesMut::with_capacity(capacity),
            capacity,
            checksum: 0,
            line_start: 0,
            stats: DecoderStats::default(),
            corruption_log: LogThrottle::new(10_000, 5),
        }
    }

    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    /// Sum modulo 256 of the bytes consumed since the last reset.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Bytes currently held for the frame in progress.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop the frame in progress and wait for the next line boundary.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.checksum = 0;
        self.line_start = 0;
        self.phase = DecoderPhase::Idle;
    }

    /// Consume one byte from the port.
    pub fn process_byte(&mut self, byte: u8) -> DecodeEvent {
        if self.buffer.len() >= self.capacity {
            self.stats.overruns += 1;
            crate::log_warn_throttled!(
                self.corruption_log,
                "VE.Direct buffer overrun after {} bytes without a frame end, resynchronizing",
                self.buffer.len()
            );
            self.reset();
            return DecodeEvent::Continue;
        }

        self.buffer.extend_from_slice(&[byte]);
        self.checksum = self.checksum.wrapping_add(byte);

        let end = self.buffer.len();
        let at_boundary =
            end >= 2 && self.buffer[end - 2] == VEDIRECT_CR && self.buffer[end - 1] == VEDIRECT_LF;

        if at_boundary {
            return match self.phase {
                DecoderPhase::Idle => {
                    self.phase = DecoderPhase::InFrame;
                    self.line_start = end;
                    DecodeEvent::Continue
                }
                DecoderPhase::InFrame => self.complete_line(end),
            };
        }

        if self.phase == DecoderPhase::InFrame && self.at_checksum_trailer(end) {
            return self.complete_frame();
        }

        DecodeEvent::Continue
    }

    fn complete_line(&mut self, end: usize) -> DecodeEvent {
        let start = self.line_start;
        self.line_start = end;

        // Back-to-back CRLF pairs carry no line.
        if end - start <= 2 {
            return DecodeEvent::Continue;
        }

        let line = String::from_utf8_lossy(&self.buffer[start..end - 2]).into_owned();
        self.stats.lines += 1;
        log::trace!("VE.Direct line {line:?}");
        DecodeEvent::LineReady(line)
    }

    /// True when the bytes since the last boundary are `Checksum\t` plus the
    /// checksum byte itself.
    fn at_checksum_trailer(&self, end: usize) -> bool {
        let pending = &self.buffer[self.line_start..end];
        pending.len() == VEDIRECT_CHECKSUM_MARKER.len() + 1
            && pending.starts_with(VEDIRECT_CHECKSUM_MARKER)
    }

    fn complete_frame(&mut self) -> DecodeEvent {
        let status = if self.checksum == 0 {
            self.stats.frames_valid += 1;
            log::trace!("VE.Direct frame of {} bytes accepted", self.buffer.len());
            FrameStatus::Valid
        } else {
            self.stats.frames_invalid += 1;
            crate::log_warn_throttled!(
                self.corruption_log,
                "VE.Direct frame of {} bytes dropped, checksum sum 0x{:02x}",
                self.buffer.len(),
                self.checksum
            );
            log_frame_hex("Rejected frame", &self.buffer);
            FrameStatus::ChecksumMismatch { sum: self.checksum }
        };

        self.reset();
        DecodeEvent::FrameComplete(status)
    }
}
