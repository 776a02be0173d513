//! Single sensor device lifecycle
//!
//! Wraps an opened rusb handle after kernel driver detach, configuration
//! selection and the init handshake. A device that failed any of those steps
//! is never constructed, so every [`TemperDevice`] can be read from.

use crate::error::{Result, SensorError};
use crate::handshake;
use rusb::{Context, Device, DeviceHandle, Direction, Recipient, RequestType};
use std::time::Duration;
use tracing::{debug, warn};

/// Interfaces the kernel HID driver binds before we take the device over.
const SENSOR_INTERFACES: [u8; 2] = [0, 1];

/// The sensor exposes a single configuration.
const ACTIVE_CONFIGURATION: u8 = 1;

/// HID GET_REPORT class request.
const GET_REPORT: u8 = 0x01;
/// wValue selecting feature report 0 (report type 3 in the high byte).
const REPORT_VALUE: u16 = 0x0300;
/// wIndex of the sensor interface.
const REPORT_INDEX: u16 = 0x0001;
/// Upper bound on the report size; the firmware answers with what it has.
const REPORT_BUFFER_SIZE: usize = 256;

/// An opened and initialized sensor
pub struct TemperDevice {
    /// Underlying rusb handle
    handle: DeviceHandle<Context>,
    /// Position in enumeration order, starting at 1
    ordinal: u32,
    /// Cached bus number for log and listing output
    bus_number: u8,
    /// Cached device address for log and listing output
    address: u8,
}

impl TemperDevice {
    /// Open a matching device and walk it through detach, configuration
    /// selection and the init handshake.
    ///
    /// Failure of any step after enumeration is fatal for this device; the
    /// handle is dropped and the error reports which step gave out.
    pub(crate) fn setup(device: Device<Context>, ordinal: u32) -> Result<Self> {
        let bus_number = device.bus_number();
        let address = device.address();

        let handle = device.open().map_err(|source| {
            warn!("Failed to open device {}: {}", ordinal, source);
            SensorError::Open { ordinal, source }
        })?;

        debug!(
            "Opened device {} (bus {:03} address {:03})",
            ordinal, bus_number, address
        );

        detach_kernel_drivers(&handle, ordinal);

        handle
            .set_active_configuration(ACTIVE_CONFIGURATION)
            .map_err(|source| {
                warn!(
                    "Failed to select configuration {} on device {}: {}",
                    ACTIVE_CONFIGURATION, ordinal, source
                );
                SensorError::Configuration { ordinal, source }
            })?;

        handshake::run(&handle, ordinal)?;

        Ok(Self {
            handle,
            ordinal,
            bus_number,
            address,
        })
    }

    /// Get the enumeration ordinal (1-based)
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Get the bus number
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    /// Get the device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Fetch one feature report from the device.
    ///
    /// Takes `&mut self` because control transfers to a device must not
    /// interleave; the exclusive borrow enforces that at compile time.
    pub fn read_report(&mut self, timeout: Duration) -> std::result::Result<Vec<u8>, rusb::Error> {
        let request_type =
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface);

        let mut buffer = vec![0u8; REPORT_BUFFER_SIZE];
        let len = self.handle.read_control(
            request_type,
            GET_REPORT,
            REPORT_VALUE,
            REPORT_INDEX,
            &mut buffer,
            timeout,
        )?;

        buffer.truncate(len);
        debug!("Read {} byte report from device {}", len, self.ordinal);
        Ok(buffer)
    }
}

/// Detach kernel drivers from both sensor interfaces, best effort.
///
/// Every outcome here is tolerable: a missing driver, an unsupported query
/// or a failed detach all leave us to try the transfers anyway, so nothing
/// logs above debug level.
fn detach_kernel_drivers(handle: &DeviceHandle<Context>, ordinal: u32) {
    for interface in SENSOR_INTERFACES {
        match handle.kernel_driver_active(interface) {
            Ok(true) => {
                debug!(
                    "Detaching kernel driver from interface {} on device {}",
                    interface, ordinal
                );
                if let Err(e) = handle.detach_kernel_driver(interface) {
                    debug!(
                        "Could not detach kernel driver from interface {}: {}",
                        interface, e
                    );
                }
            }
            Ok(false) => {
                debug!("No kernel driver active on interface {}", interface);
            }
            Err(e) => {
                // The query is not supported everywhere; detach blind.
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                if let Err(e) = handle.detach_kernel_driver(interface) {
                    debug!("Blind detach of interface {} failed: {}", interface, e);
                }
            }
        }
    }
}
