//! # VE.Direct Port Manager
//!
//! Owns the character device of one VE.Direct port and drives the frame
//! decoder from it. The only entry point of the acquisition loop is
//! [`PortManager::listen`], called once per iteration of the outer loop with a
//! time budget. Within that budget it
//!
//! 1. closes the port if the desired baud rate or device changed,
//! 2. closes the port if it has been silent for longer than the inactivity timeout,
//! 3. (re)opens the port, pausing for the backoff interval after each failure,
//! 4. periodically traces how many bytes were read,
//! 5. reads whatever is available and feeds it to the decoder.
//!
//! No I/O error escapes `listen`: failures close the port and the next call
//! reconnects. How the device is opened is behind the [`DeviceConnector`]
//! trait so tests can substitute an in-memory device.

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_BUFFER_CAPACITY, END_OF_FRAME_LINE, INACTIVITY_TIMEOUT_MS,
    READ_CHUNK_SIZE, RECONNECT_BACKOFF_MS, STATS_INTERVAL_MS,
};
use crate::error::VeDirectError;
use crate::util::clock::{sleep_ms, Clock};
use crate::util::logging::LogThrottle;
use crate::vedirect::frame::{DecodeEvent, DecoderStats, FrameDecoder, FrameStatus};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::SerialPortBuilderExt;

/// Configuration for a VE.Direct port.
#[derive(Debug, Clone)]
pub struct PortConfig {
    pub baudrate: u32,
    /// An open port that delivers nothing for this long is closed
    pub inactivity_timeout: Duration,
    /// Pause after a failed open attempt
    pub reconnect_backoff: Duration,
    /// Period of the byte-count trace
    pub stats_interval: Duration,
    /// How long a read may wait for data; zero polls without waiting
    pub read_timeout: Duration,
    /// Decoder buffer size
    pub buffer_capacity: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            baudrate: DEFAULT_BAUD_RATE,
            inactivity_timeout: Duration::from_millis(INACTIVITY_TIMEOUT_MS),
            reconnect_backoff: Duration::from_millis(RECONNECT_BACKOFF_MS),
            stats_interval: Duration::from_millis(STATS_INTERVAL_MS),
            read_timeout: Duration::ZERO,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl PortConfig {
    pub fn validate(&self) -> Result<(), VeDirectError> {
        if self.baudrate == 0 {
            return Err(VeDirectError::InvalidConfig("baud rate must be positive".into()));
        }
        if self.buffer_capacity == 0 {
            return Err(VeDirectError::InvalidConfig(
                "buffer capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Opens the character device behind a port.
#[async_trait::async_trait]
pub trait DeviceConnector: Send {
    type Stream: AsyncRead + Unpin + Send;

    async fn open(&mut self, port: &str, baudrate: u32) -> Result<Self::Stream, VeDirectError>;
}

/// Opens real serial devices: 8 data bits, no parity, 1 stop bit, no flow control.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

#[async_trait::async_trait]
impl DeviceConnector for SerialConnector {
    type Stream = tokio_serial::SerialStream;

    async fn open(&mut self, port: &str, baudrate: u32) -> Result<Self::Stream, VeDirectError> {
        tokio_serial::new(port, baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| VeDirectError::DeviceUnavailable {
                port: port.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Receives the lines decoded from a port.
///
/// On a checksum-valid frame end, `on_line` is called once more with
/// [`END_OF_FRAME_LINE`]. Frames failing their checksum end with
/// `on_frame_discarded` instead.
pub trait LineHandler: Send {
    fn on_line(&mut self, line: &str);

    fn on_frame_discarded(&mut self) {}
}

impl<F> LineHandler for F
where
    F: FnMut(&str) + Send,
{
    fn on_line(&mut self, line: &str) {
        self(line)
    }
}

/// Counters since the port manager was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub opens: u64,
    pub open_failures: u64,
    pub io_errors: u64,
    pub bytes_read: u64,
    pub decoder: DecoderStats,
}

/// Connection lifecycle and decoding for one VE.Direct port.
pub struct PortManager<C: DeviceConnector> {
    port: String,
    opened_port: String,
    config: PortConfig,
    applied_baudrate: u32,
    connector: C,
    stream: Option<C::Stream>,
    decoder: FrameDecoder,
    handler: Option<Box<dyn LineHandler>>,
    clock: Clock,
    last_byte_time: u64,
    last_stats_time: u64,
    bytes_since_stats: u64,
    stats: PortStats,
    open_log: LogThrottle,
}

impl PortManager<SerialConnector> {
    /// Port manager for a real serial device such as `/dev/ttyUSB0`.
    pub fn serial(port: &str, config: PortConfig) -> Result<Self, VeDirectError> {
        Self::new(port, config, SerialConnector)
    }
}

impl<C: DeviceConnector> PortManager<C> {
    pub fn new(port: &str, config: PortConfig, connector: C) -> Result<Self, VeDirectError> {
        config.validate()?;
        let clock = Clock::new();
        let now = clock.millis();

        Ok(PortManager {
            port: port.to_string(),
            opened_port: port.to_string(),
            applied_baudrate: config.baudrate,
            decoder: FrameDecoder::new(config.buffer_capacity),
            config,
            connector,
            stream: None,
            handler: None,
            clock,
            last_byte_time: now,
            last_stats_time: now,
            bytes_since_stats: 0,
            stats: PortStats::default(),
            open_log: LogThrottle::new(60_000, 3),
        })
    }

    /// Register the receiver of decoded lines, replacing any previous one.
    pub fn set_handler(&mut self, handler: impl LineHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Change the device; an open port is closed on the next `listen`.
    pub fn set_port(&mut self, port: &str) {
        self.port = port.to_string();
    }

    /// Change the baud rate; an open port is closed on the next `listen`.
    pub fn set_speed(&mut self, baudrate: u32) {
        self.config.baudrate = baudrate;
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn speed(&self) -> u32 {
        self.config.baudrate
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stats(&self) -> PortStats {
        PortStats {
            decoder: self.decoder.stats(),
            ..self.stats
        }
    }

    /// Bytes read since the last statistics trace.
    pub fn bytes_since_stats(&self) -> u64 {
        self.bytes_since_stats
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Release the device handle, if any.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Closed port {}", self.opened_port);
        }
    }

    /// Service the port for at most about `budget`.
    ///
    /// Returns early once no more data is available. With an absent device
    /// the call returns within `budget` plus one backoff interval.
    pub async fn listen(&mut self, budget: Duration) {
        let budget_ms = budget.as_millis() as u64;
        let t0 = self.clock.millis();

        self.check_config_change();
        self.check_inactivity(t0);
        self.try_open(t0, budget_ms).await;
        self.dump_stats(t0);
        self.read_available(t0, budget_ms).await;
    }

    fn check_config_change(&mut self) {
        if !self.is_open() {
            return;
        }
        if self.applied_baudrate != self.config.baudrate {
            log::info!(
                "Speed has changed {}->{} - reset",
                self.applied_baudrate,
                self.config.baudrate
            );
            self.close();
            self.applied_baudrate = self.config.baudrate;
        } else if self.opened_port != self.port {
            log::info!("Port has changed {}->{} - reset", self.opened_port, self.port);
            self.close();
        }
    }

    fn check_inactivity(&mut self, now: u64) {
        let silent_for = now.saturating_sub(self.last_byte_time);
        if self.is_open() && silent_for > self.config.inactivity_timeout.as_millis() as u64 {
            log::warn!(
                "Port {} inactive for {}ms - reset",
                self.opened_port,
                silent_for
            );
            self.close();
        }
    }

    async fn try_open(&mut self, t0: u64, budget_ms: u64) {
        while !self.is_open() && self.clock.elapsed_since(t0) < budget_ms {
            log::debug!("Opening port {} at {} baud", self.port, self.config.baudrate);

            match self.connector.open(&self.port, self.config.baudrate).await {
                Ok(stream) => {
                    self.stream = Some(stream);
                    self.stats.opens += 1;
                    self.opened_port = self.port.clone();
                    self.applied_baudrate = self.config.baudrate;
                    self.last_byte_time = self.clock.millis();
                    self.decoder.reset();
                    self.open_log.reset();
                    log::info!("Opened port {} at {} baud", self.port, self.config.baudrate);
                }
                Err(e) => {
                    self.stats.open_failures += 1;
                    crate::log_warn_throttled!(self.open_log, "Err opening port {}: {}", self.port, e);
                    sleep_ms(self.config.reconnect_backoff.as_millis() as u64).await;
                }
            }
        }
    }

    fn dump_stats(&mut self, now: u64) {
        let period = now.saturating_sub(self.last_stats_time);
        if period >= self.config.stats_interval.as_millis() as u64 {
            log::info!(
                "[Stats] {} bytes read in the last {}ms from {} ({})",
                self.bytes_since_stats,
                period,
                self.port,
                if self.is_open() { "open" } else { "closed" }
            );
            self.last_stats_time = now;
            self.bytes_since_stats = 0;
        }
    }

    async fn read_available(&mut self, t0: u64, budget_ms: u64) {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.clock.elapsed_since(t0) <= budget_ms {
            let Some(stream) = self.stream.as_mut() else {
                return;
            };

            let read = tokio::time::timeout(self.config.read_timeout, stream.read(&mut chunk)).await;
            match read {
                // nothing to read right now
                Err(_) => return,
                Ok(Err(e)) if e.kind() == ErrorKind::WouldBlock => return,
                Ok(Ok(0)) => {
                    log::warn!("Port {} reached end of stream", self.opened_port);
                    self.stats.io_errors += 1;
                    self.close();
                    return;
                }
                Ok(Ok(n)) => {
                    self.last_byte_time = self.clock.millis();
                    self.bytes_since_stats += n as u64;
                    self.stats.bytes_read += n as u64;
                    for &byte in &chunk[..n] {
                        self.dispatch(byte);
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("Err reading port {}: {}", self.opened_port, e);
                    self.stats.io_errors += 1;
                    self.close();
                    return;
                }
            }
        }
    }

    fn dispatch(&mut self, byte: u8) {
        let event = self.decoder.process_byte(byte);
        let Some(handler) = self.handler.as_mut() else {
            return;
        };

        match event {
            DecodeEvent::Continue => {}
            DecodeEvent::LineReady(line) => handler.on_line(&line),
            DecodeEvent::FrameComplete(FrameStatus::Valid) => handler.on_line(END_OF_FRAME_LINE),
            DecodeEvent::FrameComplete(FrameStatus::ChecksumMismatch { .. }) => {
                handler.on_frame_discarded()
            }
        }
    }
}
