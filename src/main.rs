use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::time::Duration;
use vedirect_bridge::util::sleep_ms;
use vedirect_bridge::{
    init_logger_with_level, log_info, BatteryMonitor, LogSink, MonitorConfig, PortConfig,
    PortManager,
};

#[derive(Parser)]
#[command(name = "vedirect-bridge")]
#[command(about = "Bridge a VE.Direct battery monitor onto a CAN telemetry network")]
struct Cli {
    /// VE.Direct character device, e.g. /dev/ttyUSB0
    port: String,
    /// CAN interface the battery messages are sent on
    can_device: String,
    #[arg(short, long, default_value = "19200")]
    baud: u32,
    /// Time given to the port manager per loop iteration
    #[arg(long, default_value = "50")]
    listen_budget_ms: u64,
    /// Pause between loop iterations
    #[arg(long, default_value = "200")]
    loop_pause_ms: u64,
    /// Nominal battery capacity (Ah)
    #[arg(long, default_value = "280")]
    capacity: f64,
    /// Battery instance on the telemetry network
    #[arg(long, default_value = "0")]
    instance: u8,
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger_with_level(if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let config = PortConfig {
        baudrate: cli.baud,
        ..PortConfig::default()
    };
    let mut port = PortManager::serial(&cli.port, config)
        .with_context(|| format!("Invalid settings for port {}", cli.port))?;

    let monitor_config = MonitorConfig {
        capacity_ah: cli.capacity,
        instance: cli.instance,
        ..MonitorConfig::default()
    };
    let (mut monitor, harvester) =
        BatteryMonitor::new(monitor_config, LogSink::new(&cli.can_device));
    port.set_handler(harvester);

    log_info(&format!(
        "Bridging {} at {} baud to {}",
        cli.port, cli.baud, cli.can_device
    ));

    let budget = Duration::from_millis(cli.listen_budget_ms);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = async {
                port.listen(budget).await;
                let published = monitor.publish_pending().await;
                sleep_ms(cli.loop_pause_ms).await;
                published
            } => {
                result.context("Publishing battery telemetry failed")?;
            }
        }
    }

    port.close();
    log_info(&format!(
        "Shutting down after {} snapshots, {:?}",
        monitor.published(),
        port.stats()
    ));
    Ok(())
}
