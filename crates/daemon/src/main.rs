//! temper-mqtt daemon
//!
//! Reads TEMPer USB HID thermometers and publishes a JSON record per sensor
//! to an MQTT broker on a fixed interval. Designed to sit in systemd on a
//! closet machine and be forgotten about.

mod config;
mod discovery;
mod logging;
mod publisher;
mod service;
mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use publisher::{Publisher, PublisherSettings};
use sensor::{CalibrationProfile, PRODUCT_ID, TemperDriver, VENDOR_ID};
use std::path::PathBuf;
use std::time::Duration;
use telemetry::DeviceLabel;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "temper-mqtt")]
#[command(
    author,
    version,
    about = "TEMPer USB thermometer to MQTT publisher"
)]
#[command(long_about = "
Reads TEMPer USB HID thermometers over raw control transfers and publishes
a JSON record per sensor to an MQTT broker once per interval.

EXAMPLES:
    # Publish to a broker discovered via mDNS
    temper-mqtt

    # Publish to an explicit broker with record labels
    temper-mqtt mqtt.lan 1 garage

    # Apply a +0.8 degree correction on top of decoding
    temper-mqtt mqtt.lan 1 garage 0.8

    # List detected sensors and exit
    temper-mqtt --list-devices

    # Run with debug logging
    temper-mqtt --log-level debug

CONFIGURATION:
    The daemon looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/temper-mqtt/config.toml
    3. /etc/temper-mqtt/config.toml
    4. Built-in defaults

For more information, visit: https://github.com/temper-mqtt/temper-mqtt
")]
struct Args {
    /// MQTT broker, host or host:port (falls back to config, then mDNS)
    #[arg(value_name = "BROKER")]
    broker: Option<String>,

    /// Device label for published records, ordinal or name
    #[arg(value_name = "DEVICE")]
    device: Option<String>,

    /// Location label for published records
    #[arg(value_name = "LOCATION")]
    location: Option<String>,

    /// Additive temperature correction in degrees
    #[arg(value_name = "CORRECTION", allow_negative_numbers = true)]
    correction: Option<f64>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List detected sensors and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = config::DaemonConfig::default();
        let path = config::DaemonConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified)
    let config = if let Some(ref path) = args.config {
        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        config::DaemonConfig::load(Some(path)).context("Failed to load configuration")?
    } else {
        config::DaemonConfig::load_or_default()
    };

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    logging::setup_logging(log_level).context("Failed to setup logging")?;

    info!("temper-mqtt v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    let calibration =
        CalibrationProfile::new(config.sensor.calibration_offset, config.sensor.unit);
    let read_timeout = Duration::from_millis(config.sensor.read_timeout_ms);

    let driver = TemperDriver::open(calibration, read_timeout)
        .context("Failed to initialize the USB sensor driver")?;

    if args.list_devices {
        return list_devices_mode(&driver);
    }

    // Positional fallbacks are loud so a bare invocation explains itself.
    let device = match args.device.as_deref() {
        Some(value) => DeviceLabel::parse(value),
        None => {
            let fallback = DeviceLabel::parse(&config.publish.device);
            warn!("No device label on the command line, using '{}'", fallback);
            fallback
        }
    };

    let location = match args.location {
        Some(value) => value,
        None => {
            warn!(
                "No location on the command line, using '{}'",
                config.publish.location
            );
            config.publish.location.clone()
        }
    };

    let correction = match args.correction {
        Some(value) => value,
        None => {
            warn!(
                "No correction on the command line, using {} degrees",
                config.publish.correction
            );
            config.publish.correction
        }
    };

    let broker = resolve_broker(args.broker, &config);

    let transport = transport::MqttTransport::connect(&broker, &config.broker)
        .context("Failed to start the MQTT transport")?;

    if service::is_systemd() {
        info!("Running under systemd");
    }
    service::notify_ready().context("Failed to notify systemd ready")?;
    service::notify_status(&format!(
        "Publishing {} sensor(s) every {}s",
        driver.device_count(),
        config.publish.interval_secs
    ))
    .context("Failed to send status to systemd")?;

    let settings = PublisherSettings {
        device,
        location,
        correction,
        topic: config.broker.topic.clone(),
        qos: config.broker.qos,
        interval: Duration::from_secs(config.publish.interval_secs),
    };

    let mut publisher = Publisher::new(driver, transport, settings);
    publisher.run()
}

/// Pick the broker address: command line, then config, then mDNS.
///
/// Exits with status 1 when all three come up empty. Publishing is the whole
/// job; there is nothing useful to do without a broker.
fn resolve_broker(cli: Option<String>, config: &config::DaemonConfig) -> String {
    if let Some(address) = cli {
        return address;
    }

    if let Some(address) = config.broker.address.clone() {
        info!("Using broker address from config: {}", address);
        return address;
    }

    warn!("No broker on the command line or in the config, trying mDNS discovery");
    match discovery::discover_broker(discovery::DISCOVERY_BUDGET) {
        Some(broker) => {
            info!(
                "Discovered broker {} at {}:{}",
                broker.name, broker.host, broker.port
            );
            format!("{}:{}", broker.host, broker.port)
        }
        None => {
            error!("No MQTT broker given and none discovered; cannot publish anything");
            std::process::exit(1);
        }
    }
}

/// List detected sensors and exit
fn list_devices_mode(driver: &TemperDriver) -> Result<()> {
    if driver.device_count() == 0 {
        println!("No TEMPer sensors found.");
    } else {
        println!("Found {} TEMPer sensor(s):\n", driver.device_count());
        for device in driver.devices() {
            println!(
                "  [{}] {:04x}:{:04x} - Bus {:03} Device {:03}",
                device.ordinal(),
                VENDOR_ID,
                PRODUCT_ID,
                device.bus_number(),
                device.address()
            );
        }
    }

    Ok(())
}
