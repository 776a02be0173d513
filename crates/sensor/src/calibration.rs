//! Calibration and unit handling
//!
//! Calibration is additive and applied in raw count space, before the scale
//! factor, which matches how the vendor software trims these sensors.

use crate::decode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Factory calibration offset in raw sensor counts.
///
/// Uncorrected boards read about 0.06 C low; 15 counts cancels that out.
pub const DEFAULT_CALIBRATION_OFFSET: i32 = 15;

/// Temperature unit for decoded readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Unit {
    /// Convert a Celsius value into this unit.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Unit::Celsius => celsius,
            Unit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Unit::Kelvin => celsius + 273.15,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::Celsius => "Celsius",
            Unit::Fahrenheit => "Fahrenheit",
            Unit::Kelvin => "Kelvin",
        };
        write!(f, "{}", name)
    }
}

/// Per-driver calibration settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    /// Additive correction in raw counts
    pub offset: i32,
    /// Unit of the decoded output
    pub unit: Unit,
}

impl CalibrationProfile {
    pub fn new(offset: i32, unit: Unit) -> Self {
        Self { offset, unit }
    }

    /// Decode a report's leading byte pair into a calibrated reading.
    pub fn decode(&self, msb: u8, lsb: u8) -> f64 {
        self.unit
            .from_celsius(decode::decode_celsius(msb, lsb, self.offset))
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self {
            offset: DEFAULT_CALIBRATION_OFFSET,
            unit: Unit::Celsius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = CalibrationProfile::default();
        assert_eq!(profile.offset, 15);
        assert_eq!(profile.unit, Unit::Celsius);
    }

    #[test]
    fn test_celsius_passthrough() {
        assert_eq!(Unit::Celsius.from_celsius(21.5), 21.5);
    }

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(Unit::Fahrenheit.from_celsius(0.0), 32.0);
        assert_eq!(Unit::Fahrenheit.from_celsius(100.0), 212.0);
        assert_eq!(Unit::Fahrenheit.from_celsius(20.5), 20.5 * 9.0 / 5.0 + 32.0);
    }

    #[test]
    fn test_kelvin_conversion() {
        assert_eq!(Unit::Kelvin.from_celsius(0.0), 273.15);
        assert_eq!(Unit::Kelvin.from_celsius(-273.15), 0.0);
    }

    #[test]
    fn test_decode_applies_offset_before_unit() {
        // 5248 counts + 0 offset = 20.5 C; conversion happens after the offset.
        let profile = CalibrationProfile::new(0, Unit::Fahrenheit);
        assert_eq!(profile.decode(0x14, 0x80), 20.5 * 9.0 / 5.0 + 32.0);

        // 256 extra counts raise the reading by exactly 1 C before conversion.
        let trimmed = CalibrationProfile::new(256, Unit::Kelvin);
        assert_eq!(trimmed.decode(0x14, 0x80), 21.5 + 273.15);
    }

    #[test]
    fn test_unit_display_names() {
        assert_eq!(Unit::Celsius.to_string(), "Celsius");
        assert_eq!(Unit::Fahrenheit.to_string(), "Fahrenheit");
        assert_eq!(Unit::Kelvin.to_string(), "Kelvin");
    }

    #[test]
    fn test_unit_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Unit::Celsius).unwrap(), "\"celsius\"");
        assert_eq!(
            serde_json::from_str::<Unit>("\"fahrenheit\"").unwrap(),
            Unit::Fahrenheit
        );
        assert!(serde_json::from_str::<Unit>("\"Kelvin\"").is_err());
    }
}
