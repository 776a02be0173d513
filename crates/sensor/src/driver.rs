//! Sensor discovery and reading
//!
//! [`TemperDriver`] enumerates every matching sensor once at startup, brings
//! each one through its setup sequence, and then serves calibrated readings
//! on demand. Setup failures are fatal for the unit they hit but never take
//! down the rest of the fleet.

use crate::calibration::{CalibrationProfile, Unit};
use crate::decode;
use crate::device::TemperDevice;
use crate::error::{Result, SensorError};
use rusb::{Context, UsbContext};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// USB vendor ID of the sensor family.
pub const VENDOR_ID: u16 = 0x1130;
/// USB product ID of the sensor family.
pub const PRODUCT_ID: u16 = 0x660c;

/// Default timeout for the feature report read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything the publisher can poll for temperatures.
///
/// Indexes are dense, `0..device_count()`. Implementations degrade transient
/// read failures to 0.0 instead of erroring, so a caller's loop never has to
/// unwind mid-cycle.
pub trait TemperatureSource {
    /// Number of readable devices
    fn device_count(&self) -> usize;

    /// Read one device, in the source's configured unit
    fn read_temperature(&mut self, index: usize) -> f64;
}

/// Driver over every TEMPer sensor attached to the host
pub struct TemperDriver {
    /// Successfully initialized devices, in enumeration order
    devices: Vec<TemperDevice>,
    /// Calibration applied to every read
    calibration: CalibrationProfile,
    /// Timeout for a single report read
    read_timeout: Duration,
}

impl TemperDriver {
    /// Enumerate the bus and initialize every matching sensor.
    ///
    /// A sensor that fails open, configuration or handshake is logged and
    /// skipped; an empty fleet is not an error. Only a broken USB stack
    /// (context or enumeration failure) returns `Err`.
    pub fn open(calibration: CalibrationProfile, read_timeout: Duration) -> Result<Self> {
        let context = Context::new().map_err(SensorError::Context)?;
        let mut matching = Vec::new();

        for device in context.devices().map_err(SensorError::Enumeration)?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!("Skipping device without readable descriptor: {}", e);
                    continue;
                }
            };

            if descriptor.vendor_id() == VENDOR_ID && descriptor.product_id() == PRODUCT_ID {
                matching.push(device);
            }
        }

        let devices = initialize_fleet(matching, |device, ordinal| {
            let device = TemperDevice::setup(device, ordinal)?;
            info!(
                "Initialized sensor {} (bus {:03} address {:03})",
                ordinal,
                device.bus_number(),
                device.address()
            );
            Ok(device)
        });

        if devices.is_empty() {
            warn!(
                "No sensors found (looking for {:04x}:{:04x})",
                VENDOR_ID, PRODUCT_ID
            );
        } else {
            info!("{} sensor(s) ready", devices.len());
        }

        Ok(Self {
            devices,
            calibration,
            read_timeout,
        })
    }

    /// Get the initialized devices, in enumeration order
    pub fn devices(&self) -> &[TemperDevice] {
        &self.devices
    }

    /// Number of initialized devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Get the current calibration profile
    pub fn calibration(&self) -> CalibrationProfile {
        self.calibration
    }

    /// Replace the calibration offset used by subsequent reads.
    pub fn set_calibration(&mut self, offset: i32) {
        debug!("Calibration offset set to {} counts", offset);
        self.calibration.offset = offset;
    }

    /// Switch the unit used by subsequent reads.
    pub fn set_unit(&mut self, unit: Unit) {
        debug!("Unit set to {}", unit);
        self.calibration.unit = unit;
    }

    /// Read one sensor and return a calibrated value in the configured unit.
    ///
    /// Transient problems degrade to exactly 0.0 with a warning rather than
    /// an error: a failed or timed out transfer, a report shorter than two
    /// bytes, the firmware's failure sentinel, or an index past the fleet.
    /// The 0.0 is returned as-is, with no calibration or unit conversion.
    pub fn read_temperature(&mut self, index: usize) -> f64 {
        let Some(device) = self.devices.get_mut(index) else {
            warn!("No sensor at index {}", index);
            return 0.0;
        };

        let outcome = device.read_report(self.read_timeout);
        interpret_report(outcome, self.calibration, device.ordinal())
    }
}

/// Run every matched candidate through setup, keeping the survivors.
///
/// A candidate that fails setup still consumes its ordinal, so the numbering
/// matches what a fully healthy run would have produced, and the failure
/// never spreads to the rest of the fleet.
fn initialize_fleet<C, D>(
    candidates: impl IntoIterator<Item = C>,
    mut setup: impl FnMut(C, u32) -> Result<D>,
) -> Vec<D> {
    let mut devices = Vec::new();
    let mut matched = 0u32;

    for candidate in candidates {
        matched += 1;
        match setup(candidate, matched) {
            Ok(device) => devices.push(device),
            Err(e) => {
                // This unit is unusable; others may still come up.
                error!("Sensor {} setup failed: {}", matched, e);
            }
        }
    }

    devices
}

/// Turn one transfer outcome into the value a caller sees.
///
/// Degraded outcomes (a failed or timed out transfer, the firmware's failure
/// sentinel, a report shorter than two bytes) become exactly 0.0 with a
/// warning; calibration and unit conversion apply to healthy reports only.
fn interpret_report(
    outcome: std::result::Result<Vec<u8>, rusb::Error>,
    calibration: CalibrationProfile,
    ordinal: u32,
) -> f64 {
    match outcome {
        Ok(report) if decode::is_failure_sentinel(&report) => {
            warn!("Sensor {} reported a failed measurement", ordinal);
            0.0
        }
        Ok(report) => match report.as_slice() {
            [msb, lsb, ..] => {
                let value = calibration.decode(*msb, *lsb);
                debug!("Sensor {} read {:.4} {}", ordinal, value, calibration.unit);
                value
            }
            _ => {
                warn!(
                    "Sensor {} returned a short report ({} bytes)",
                    ordinal,
                    report.len()
                );
                0.0
            }
        },
        Err(e) => {
            warn!("Read from sensor {} failed: {}", ordinal, e);
            0.0
        }
    }
}

impl TemperatureSource for TemperDriver {
    fn device_count(&self) -> usize {
        TemperDriver::device_count(self)
    }

    fn read_temperature(&mut self, index: usize) -> f64 {
        TemperDriver::read_temperature(self, index)
    }
}
