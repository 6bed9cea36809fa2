//! End-to-end scenarios: bytes queued on a mock device come out as battery
//! messages, with the port manager, decoder, registry and monitor all real.


use mock_support::{corrupted_frame, vedirect_frame, RecordingSink};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vedirect_bridge::battery_monitor::{BatteryMonitor, MonitorConfig};
use vedirect_bridge::constants::END_OF_FRAME_LINE;
use vedirect_bridge::vedirect::schema::{STATE_OF_CHARGE, VOLTAGE};
use vedirect_bridge::vedirect::serial_mock::MockConnector;
use vedirect_bridge::vedirect::{FieldRegistry, PortConfig, PortManager, BMV_FIELDS};

const BUDGET: Duration = Duration::from_millis(50);

#[tokio::test(start_paused = true)]
async fn e2e_registry_sees_frame_before_reset() {
    let connector = MockConnector::new();
    let device = connector.device();
    let mut port = PortManager::new("/dev/ttyUSB0", PortConfig::default(), connector).unwrap();

    // (voltage, soc, valid) observed at each sentinel, then (valid) after reset
    let observed = Arc::new(Mutex::new(Vec::new()));
    let seen = observed.clone();
    let mut registry = FieldRegistry::new(&BMV_FIELDS);
    port.set_handler(move |line: &str| {
        if line == END_OF_FRAME_LINE {
            seen.lock().unwrap().push((
                registry.get_scaled(VOLTAGE.index, 0.001),
                registry.get_scaled(STATE_OF_CHARGE.index, 0.1),
                registry.is_valid(),
            ));
            registry.reset();
            seen.lock().unwrap().push((None, None, registry.is_valid()));
        } else {
            registry.load_key_value(line, 1);
        }
    });

    device.queue_rx_data(&vedirect_frame(&["V\t12488", "SOC\t1960"]));
    port.listen(BUDGET).await;

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 2);
    let (volts, soc, valid) = observed[0];
    assert!((volts.unwrap() - 12.488).abs() < 1e-9);
    assert!((soc.unwrap() - 196.0).abs() < 1e-9);
    assert!(valid);
    assert_eq!(observed[1], (None, None, false));
}

#[tokio::test(start_paused = true)]
async fn e2e_frame_becomes_battery_messages() {
    let connector = MockConnector::new();
    let device = connector.device();
    let mut port = PortManager::new("/dev/ttyUSB0", PortConfig::default(), connector).unwrap();

    let sink = RecordingSink::default();
    let config = MonitorConfig {
        capacity_ah: 200.0,
        instance: 3,
        ..MonitorConfig::default()
    };
    let (mut monitor, harvester) = BatteryMonitor::new(config, sink.clone());
    port.set_handler(harvester);

    device.queue_rx_data(&vedirect_frame(&[
        "PID\t0xA381",
        "V\t12488",
        "I\t-2300",
        "SOC\t876",
        "TTG\t415",
        "T\t18",
    ]));
    port.listen(BUDGET).await;
    assert!(monitor.publish_pending().await.unwrap());

    let battery = sink.battery.lock().unwrap().clone();
    let status = sink.status.lock().unwrap().clone();
    assert_eq!(battery.len(), 1);
    assert_eq!(status.len(), 1);

    assert_eq!(battery[0].instance, 3);
    assert!((battery[0].voltage.unwrap() - 12.488).abs() < 1e-9);
    assert!((battery[0].current.unwrap() + 2.3).abs() < 1e-9);
    assert_eq!(battery[0].temperature, Some(18.0));

    assert!((status[0].state_of_charge.unwrap() - 87.6).abs() < 1e-9);
    assert_eq!(status[0].capacity_ah, 200.0);
    assert_eq!(status[0].time_to_go_minutes, Some(415.0));
    assert_ne!(battery[0].sid, status[0].sid);
}

#[tokio::test(start_paused = true)]
async fn e2e_corrupted_frame_is_never_published() {
    let connector = MockConnector::new();
    let device = connector.device();
    let mut port = PortManager::new("p", PortConfig::default(), connector).unwrap();
    let sink = RecordingSink::default();
    let (mut monitor, harvester) = BatteryMonitor::new(MonitorConfig::default(), sink.clone());
    port.set_handler(harvester);

    device.queue_rx_data(&corrupted_frame(&["V\t99999", "I\t1000"]));
    port.listen(BUDGET).await;
    assert!(!monitor.publish_pending().await.unwrap());

    device.queue_rx_data(&vedirect_frame(&["SOC\t500"]));
    port.listen(BUDGET).await;
    assert!(monitor.publish_pending().await.unwrap());

    let battery = sink.battery.lock().unwrap().clone();
    assert_eq!(battery.len(), 1);
    assert_eq!(battery[0].voltage, None);
    assert_eq!(battery[0].current, None);
    assert_eq!(port.stats().decoder.frames_invalid, 1);
}

#[tokio::test(start_paused = true)]
async fn e2e_only_latest_snapshot_is_published() {
    let connector = MockConnector::new();
    let device = connector.device();
    let mut port = PortManager::new("p", PortConfig::default(), connector).unwrap();
    let sink = RecordingSink::default();
    let (mut monitor, harvester) = BatteryMonitor::new(MonitorConfig::default(), sink.clone());
    port.set_handler(harvester);

    device.queue_rx_data(&vedirect_frame(&["V\t12000"]));
    device.queue_rx_data(&vedirect_frame(&["V\t12100"]));
    device.queue_rx_data(&vedirect_frame(&["V\t12200"]));
    port.listen(BUDGET).await;
    monitor.publish_pending().await.unwrap();

    let battery = sink.battery.lock().unwrap().clone();
    assert_eq!(battery.len(), 1);
    assert!((battery[0].voltage.unwrap() - 12.2).abs() < 1e-9);
    assert_eq!(monitor.published(), 1);
}

#[tokio::test(start_paused = true)]
async fn e2e_sequence_ids_advance_per_message() {
    let connector = MockConnector::new();
    let device = connector.device();
    let mut port = PortManager::new("p", PortConfig::default(), connector).unwrap();
    let sink = RecordingSink::default();
    let (mut monitor, harvester) = BatteryMonitor::new(MonitorConfig::default(), sink.clone());
    port.set_handler(harvester);

    for soc in ["100", "200"] {
        let line = format!("SOC\t{soc}");
        device.queue_rx_data(&vedirect_frame(&[line.as_str()]));
        port.listen(BUDGET).await;
        monitor.publish_pending().await.unwrap();
    }
    assert!(!monitor.publish_pending().await.unwrap());

    let battery: Vec<u8> = sink.battery.lock().unwrap().iter().map(|m| m.sid).collect();
    let status: Vec<u8> = sink.status.lock().unwrap().iter().map(|m| m.sid).collect();
    assert_eq!(battery, vec![0, 2]);
    assert_eq!(status, vec![1, 3]);
}

#[tokio::test(start_paused = true)]
async fn e2e_device_plugged_in_late() {
    let connector = MockConnector::unplugged();
    let device = connector.device();
    let mut port = PortManager::new("p", PortConfig::default(), connector.clone()).unwrap();
    let sink = RecordingSink::default();
    let (mut monitor, harvester) = BatteryMonitor::new(MonitorConfig::default(), sink.clone());
    port.set_handler(harvester);

    port.listen(BUDGET).await;
    assert!(!monitor.publish_pending().await.unwrap());

    connector.set_available(true);
    device.queue_rx_data(&vedirect_frame(&["V\t13100"]));
    port.listen(BUDGET).await;
    assert!(monitor.publish_pending().await.unwrap());
    assert_eq!(sink.battery.lock().unwrap().len(), 1);
}
