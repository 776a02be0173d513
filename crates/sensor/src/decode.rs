//! Raw sample decoding
//!
//! The TEMPer sensor reports temperature as a big-endian 16-bit count in the
//! first two bytes of its feature report. This module holds the pure
//! count-to-Celsius arithmetic so it can be tested without hardware.

/// Degrees Celsius per raw sensor count.
///
/// The sensor counts in 1/256ths of a degree; the vendor documentation writes
/// the scale as 125/32000, which reduces to the same dyadic value, so the
/// conversion is exact in an `f64`.
pub const CELSIUS_PER_COUNT: f64 = 125.0 / 32000.0;

/// Leading byte pair the firmware emits when the measurement failed.
pub const FAILURE_SENTINEL: (u8, u8) = (0x00, 0xFF);

/// Check whether a report starts with the firmware's failure sentinel.
///
/// Reports shorter than two bytes are not sentinels; callers treat them as
/// degraded reads in their own right.
pub fn is_failure_sentinel(report: &[u8]) -> bool {
    report.len() >= 2 && report[0] == FAILURE_SENTINEL.0 && report[1] == FAILURE_SENTINEL.1
}

/// Decode the leading byte pair of a report into degrees Celsius.
///
/// The raw count is `(msb << 8) + lsb`, offset by the calibration correction
/// in count space before scaling: `(count + offset) * 125 / 32000`.
pub fn decode_celsius(msb: u8, lsb: u8, offset: i32) -> f64 {
    // Summed in i64 so a pathological offset cannot wrap the count.
    let count = (i64::from(msb) << 8) + i64::from(lsb) + i64::from(offset);
    count as f64 * CELSIUS_PER_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_exact() {
        // 125/32000 reduces to 1/256, which f64 represents exactly.
        assert_eq!(CELSIUS_PER_COUNT, 0.00390625);
    }

    #[test]
    fn test_decode_known_report() {
        // Count 0x0064 = 100, plus the stock offset of 15: 115/256 degrees.
        assert_eq!(decode_celsius(0x00, 0x64, 15), 0.44921875);
    }

    #[test]
    fn test_decode_room_temperature() {
        // 0x1480 = 5248 counts -> 20.5 C with no offset.
        assert_eq!(decode_celsius(0x14, 0x80, 0), 20.5);
    }

    #[test]
    fn test_msb_weighting() {
        // The first byte carries the high 8 bits of the count.
        assert_eq!(decode_celsius(0x01, 0x00, 0), 256.0 * CELSIUS_PER_COUNT);
        assert_eq!(decode_celsius(0x00, 0x01, 0), CELSIUS_PER_COUNT);
    }

    #[test]
    fn test_offset_shifts_by_scale() {
        let base = decode_celsius(0x12, 0x34, 0);
        assert_eq!(decode_celsius(0x12, 0x34, 1) - base, CELSIUS_PER_COUNT);
        assert_eq!(decode_celsius(0x12, 0x34, -32), base - 32.0 * CELSIUS_PER_COUNT);
    }

    #[test]
    fn test_negative_offset_can_go_below_zero() {
        assert!(decode_celsius(0x00, 0x10, -100) < 0.0);
    }

    #[test]
    fn test_extreme_offsets_do_not_wrap() {
        // Both extremes of the offset's type stay ordinary arithmetic.
        assert_eq!(
            decode_celsius(0xFF, 0xFF, i32::MAX),
            (65_535.0 + 2_147_483_647.0) / 256.0
        );
        assert_eq!(decode_celsius(0x00, 0x00, i32::MIN), -2_147_483_648.0 / 256.0);
    }

    #[test]
    fn test_failure_sentinel_detection() {
        assert!(is_failure_sentinel(&[0x00, 0xFF]));
        assert!(is_failure_sentinel(&[0x00, 0xFF, 0xAA, 0xBB]));
        assert!(!is_failure_sentinel(&[0x00, 0xFE]));
        assert!(!is_failure_sentinel(&[0x01, 0xFF]));
        assert!(!is_failure_sentinel(&[0x00]));
        assert!(!is_failure_sentinel(&[]));
    }
}
