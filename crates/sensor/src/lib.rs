//! USB driver for TEMPer HID thermometers
//!
//! Talks to the 0x1130:0x660c sensor family over raw control transfers:
//! enumeration, kernel driver detach, the vendor init handshake, and the
//! feature report reads that carry the measurement. Decoding and calibration
//! are pure functions, kept separate from the transfer plumbing so they can
//! be tested without a sensor plugged in.
//!
//! # Example
//!
//! ```no_run
//! use sensor::{CalibrationProfile, TemperDriver};
//! use std::time::Duration;
//!
//! let mut driver = TemperDriver::open(CalibrationProfile::default(), Duration::from_secs(5))?;
//! for index in 0..driver.device_count() {
//!     println!("sensor {}: {:.1}", index + 1, driver.read_temperature(index));
//! }
//! # Ok::<(), sensor::SensorError>(())
//! ```

pub mod calibration;
pub mod decode;
pub mod device;
pub mod driver;
pub mod error;
pub mod handshake;

pub use calibration::{CalibrationProfile, DEFAULT_CALIBRATION_OFFSET, Unit};
pub use device::TemperDevice;
pub use driver::{
    DEFAULT_READ_TIMEOUT, PRODUCT_ID, TemperDriver, TemperatureSource, VENDOR_ID,
};
pub use error::{Result, SensorError};
pub use handshake::{FLUSH_REPEATS, HandshakeStep};
