//! # Battery Monitor
//!
//! The consumer side of the bridge. A [`FrameHarvester`] is registered as the
//! port manager's line handler: it loads every decoded line into a
//! [`FieldRegistry`] over the BMV schema and, when the end-of-frame sentinel
//! arrives, turns the registry into a [`BatterySnapshot`] and resets it. Only
//! checksum-valid frames ever produce a snapshot.
//!
//! Snapshots travel over a channel to the [`BatteryMonitor`], which converts
//! them into the two battery messages of the telemetry network and hands them
//! to a [`TelemetrySink`]. Putting messages on the CAN bus is the sink's job;
//! [`LogSink`] just writes them to the log as JSON.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vedirect_bridge::battery_monitor::{BatteryMonitor, LogSink, MonitorConfig};
//! use vedirect_bridge::vedirect::{PortConfig, PortManager};
//!
//! # async fn run() -> Result<(), vedirect_bridge::VeDirectError> {
//! let mut port = PortManager::serial("/dev/ttyUSB0", PortConfig::default())?;
//! let (mut monitor, harvester) = BatteryMonitor::new(MonitorConfig::default(), LogSink::new("can0"));
//! port.set_handler(harvester);
//!
//! loop {
//!     port.listen(Duration::from_millis(50)).await;
//!     monitor.publish_pending().await?;
//! }
//! # }
//! ```

use crate::constants::END_OF_FRAME_LINE;
use crate::error::VeDirectError;
use crate::util::clock::Clock;
use crate::vedirect::registry::FieldRegistry;
use crate::vedirect::schema::{
    ALARM, BMV_FIELDS, CONSUMED, CURRENT, FIRMWARE, MODEL, POWER, RELAY, STATE_OF_CHARGE,
    TEMPERATURE, TIME_TO_GO, VOLTAGE, VOLTAGE_AUX,
};
use crate::vedirect::serial::LineHandler;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Settings of the published battery messages.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Nominal battery capacity reported in status messages (Ah)
    pub capacity_ah: f64,
    /// Battery instance on the telemetry network
    pub instance: u8,
    /// Older temperature readings are reported as unavailable
    pub temperature_max_age: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            capacity_ah: 280.0,
            instance: 0,
            temperature_max_age: Duration::from_millis(500),
        }
    }
}

/// Values of one checksum-valid frame, in physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySnapshot {
    /// V
    pub voltage: Option<f64>,
    /// Auxiliary (starter) battery voltage, V
    pub voltage_aux: Option<f64>,
    /// A, negative when discharging
    pub current: Option<f64>,
    /// W
    pub power: Option<f64>,
    /// %
    pub state_of_charge: Option<f64>,
    /// Ah
    pub consumed_ah: Option<f64>,
    /// Absent while the monitor reports an infinite time to go
    pub time_to_go_minutes: Option<f64>,
    /// °C
    pub temperature: Option<f64>,
    pub alarm: Option<bool>,
    pub relay: Option<bool>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    /// Clock time of the harvest, ms
    pub harvested_at: u64,
}

impl BatterySnapshot {
    /// Read the BMV fields out of `registry`.
    pub fn from_registry(registry: &FieldRegistry, now: u64, temperature_max_age: Duration) -> Self {
        let temperature_age = now.saturating_sub(registry.get_last_timestamp(TEMPERATURE.index));
        let temperature = registry
            .get_scaled(TEMPERATURE.index, 1.0)
            .filter(|_| temperature_age < temperature_max_age.as_millis() as u64);

        BatterySnapshot {
            voltage: registry.get_scaled(VOLTAGE.index, 0.001),
            voltage_aux: registry.get_scaled(VOLTAGE_AUX.index, 0.001),
            current: registry.get_scaled(CURRENT.index, 0.001),
            power: registry.get_scaled(POWER.index, 1.0),
            state_of_charge: registry.get_scaled(STATE_OF_CHARGE.index, 0.1),
            consumed_ah: registry.get_scaled(CONSUMED.index, 0.001),
            time_to_go_minutes: registry
                .get_scaled(TIME_TO_GO.index, 1.0)
                .filter(|ttg| *ttg > 0.0),
            temperature,
            alarm: registry.get_boolean(ALARM.index),
            relay: registry.get_boolean(RELAY.index),
            model: registry.get_string(MODEL.index).map(str::to_string),
            firmware: registry.get_string(FIRMWARE.index).map(str::to_string),
            harvested_at: now,
        }
    }
}

/// Line handler that turns valid frames into snapshots.
pub struct FrameHarvester {
    registry: FieldRegistry,
    clock: Clock,
    temperature_max_age: Duration,
    tx: mpsc::UnboundedSender<BatterySnapshot>,
}

impl FrameHarvester {
    pub fn new(config: &MonitorConfig, tx: mpsc::UnboundedSender<BatterySnapshot>) -> Self {
        FrameHarvester {
            registry: FieldRegistry::new(&BMV_FIELDS),
            clock: Clock::new(),
            temperature_max_age: config.temperature_max_age,
            tx,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    fn harvest(&mut self) {
        if self.registry.is_valid() {
            let snapshot = BatterySnapshot::from_registry(
                &self.registry,
                self.clock.millis(),
                self.temperature_max_age,
            );
            if self.tx.send(snapshot).is_err() {
                log::debug!("Snapshot dropped, monitor is gone");
            }
        }
        self.registry.reset();
    }
}

impl LineHandler for FrameHarvester {
    fn on_line(&mut self, line: &str) {
        if line == END_OF_FRAME_LINE {
            self.harvest();
        } else {
            self.registry.load_key_value(line, self.clock.millis());
        }
    }

    fn on_frame_discarded(&mut self) {
        self.registry.reset();
    }
}

/// Battery voltage, current and temperature message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryMessage {
    pub sid: u8,
    pub instance: u8,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub temperature: Option<f64>,
}

/// State of charge, capacity and time-to-go message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatusMessage {
    pub sid: u8,
    pub instance: u8,
    pub state_of_charge: Option<f64>,
    pub capacity_ah: f64,
    pub time_to_go_minutes: Option<f64>,
}

/// Transmitter of battery messages onto the telemetry network.
#[async_trait::async_trait]
pub trait TelemetrySink: Send {
    async fn send_battery(&mut self, message: &BatteryMessage) -> Result<(), VeDirectError>;

    async fn send_battery_status(
        &mut self,
        message: &BatteryStatusMessage,
    ) -> Result<(), VeDirectError>;
}

/// Writes every message to the log as a JSON line.
#[derive(Debug, Clone)]
pub struct LogSink {
    device: String,
    sent: u64,
}

impl LogSink {
    pub fn new(device: &str) -> Self {
        LogSink {
            device: device.to_string(),
            sent: 0,
        }
    }

    /// Messages written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

#[async_trait::async_trait]
impl TelemetrySink for LogSink {
    async fn send_battery(&mut self, message: &BatteryMessage) -> Result<(), VeDirectError> {
        let json = serde_json::to_string(message)?;
        log::info!(target: "vedirect::telemetry", "{} battery {}", self.device, json);
        self.sent += 1;
        Ok(())
    }

    async fn send_battery_status(
        &mut self,
        message: &BatteryStatusMessage,
    ) -> Result<(), VeDirectError> {
        let json = serde_json::to_string(message)?;
        log::info!(target: "vedirect::telemetry", "{} battery status {}", self.device, json);
        self.sent += 1;
        Ok(())
    }
}

/// Forwards harvested snapshots to a telemetry sink.
pub struct BatteryMonitor<S: TelemetrySink> {
    config: MonitorConfig,
    sink: S,
    rx: mpsc::UnboundedReceiver<BatterySnapshot>,
    sid: u8,
    published: u64,
}

impl<S: TelemetrySink> BatteryMonitor<S> {
    /// Create the monitor and the harvester that feeds it.
    pub fn new(config: MonitorConfig, sink: S) -> (Self, FrameHarvester) {
        let (tx, rx) = mpsc::unbounded_channel();
        let harvester = FrameHarvester::new(&config, tx);
        let monitor = BatteryMonitor {
            config,
            sink,
            rx,
            sid: 0,
            published: 0,
        };
        (monitor, harvester)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Snapshots published so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Send the battery and battery-status messages for `snapshot`.
    pub async fn publish(&mut self, snapshot: &BatterySnapshot) -> Result<(), VeDirectError> {
        let battery = BatteryMessage {
            sid: self.next_sid(),
            instance: self.config.instance,
            voltage: snapshot.voltage,
            current: snapshot.current,
            temperature: snapshot.temperature,
        };
        self.sink.send_battery(&battery).await?;

        let status = BatteryStatusMessage {
            sid: self.next_sid(),
            instance: self.config.instance,
            state_of_charge: snapshot.state_of_charge,
            capacity_ah: self.config.capacity_ah,
            time_to_go_minutes: snapshot.time_to_go_minutes,
        };
        self.sink.send_battery_status(&status).await?;

        self.published += 1;
        Ok(())
    }

    /// Publish the newest snapshot harvested since the last call, if any.
    ///
    /// Older snapshots still queued are superseded and dropped.
    pub async fn publish_pending(&mut self) -> Result<bool, VeDirectError> {
        let mut latest = None;
        let mut superseded = 0usize;
        while let Ok(snapshot) = self.rx.try_recv() {
            if latest.replace(snapshot).is_some() {
                superseded += 1;
            }
        }
        if superseded > 0 {
            log::debug!("{superseded} snapshots superseded before publishing");
        }

        match latest {
            Some(snapshot) => {
                self.publish(&snapshot).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn next_sid(&mut self) -> u8 {
        let sid = self.sid;
        self.sid = self.sid.wrapping_add(1);
        sid
    }
}
