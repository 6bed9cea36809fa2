//! Mock serial device for testing
//!
//! This module provides an in-memory VE.Direct device and a matching
//! [`DeviceConnector`] so the port manager can be exercised without hardware:
//! bytes are queued from the test, the device can be "unplugged", and read
//! errors can be injected.

use crate::error::VeDirectError;
use crate::vedirect::serial::DeviceConnector;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, ReadBuf};

#[derive(Default)]
struct DeviceState {
    rx: VecDeque<u8>,
    next_error: Option<io::Error>,
    eof: bool,
    waker: Option<Waker>,
}

/// Readable end of the mock device. Clones share the same receive queue.
#[derive(Clone, Default)]
pub struct MockSerialPort {
    state: Arc<Mutex<DeviceState>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.rx.extend(data);
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    /// Bytes queued but not yet read.
    pub fn pending(&self) -> usize {
        self.state.lock().unwrap().rx.len()
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: io::Error) {
        let mut state = self.state.lock().unwrap();
        state.next_error = Some(error);
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    /// Make reads report end of stream once the queue is drained.
    pub fn set_eof(&self, eof: bool) {
        self.state.lock().unwrap().eof = eof;
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().rx.clear();
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self.state.lock().unwrap();

        if let Some(error) = state.next_error.take() {
            return Poll::Ready(Err(error));
        }

        if state.rx.is_empty() {
            if state.eof {
                return Poll::Ready(Ok(()));
            }
            state.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let available = state.rx.len().min(buf.remaining());
        let data: Vec<u8> = state.rx.drain(..available).collect();
        buf.put_slice(&data);
        Poll::Ready(Ok(()))
    }
}

#[derive(Default)]
struct ConnectorState {
    unavailable: bool,
    attempts: usize,
    opened_with: Vec<(String, u32)>,
}

/// Hands out [`MockSerialPort`]s sharing one device, or fails while unplugged.
#[derive(Clone, Default)]
pub struct MockConnector {
    device: MockSerialPort,
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose device is absent until [`set_available`](Self::set_available).
    pub fn unplugged() -> Self {
        let connector = Self::default();
        connector.set_available(false);
        connector
    }

    /// The device every successful open returns.
    pub fn device(&self) -> MockSerialPort {
        self.device.clone()
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().unavailable = !available;
    }

    /// Open calls so far, failed ones included.
    pub fn open_attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    /// `(port, baudrate)` of every successful open, in order.
    pub fn opened_with(&self) -> Vec<(String, u32)> {
        self.state.lock().unwrap().opened_with.clone()
    }
}

#[async_trait::async_trait]
impl DeviceConnector for MockConnector {
    type Stream = MockSerialPort;

    async fn open(&mut self, port: &str, baudrate: u32) -> Result<Self::Stream, VeDirectError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;

        if state.unavailable {
            return Err(VeDirectError::DeviceUnavailable {
                port: port.to_string(),
                reason: "No such file or directory".into(),
            });
        }

        state.opened_with.push((port.to_string(), baudrate));
        Ok(self.device.clone())
    }
}
