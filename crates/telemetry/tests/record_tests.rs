//! Wire format tests
//!
//! Downstream collectors compare payloads textually, so these pin the exact
//! bytes: key order, timestamp shape, numeric rendering.

use chrono::{Local, TimeZone};
use telemetry::{DeviceLabel, PublishRecord, Reading};

fn fixed_reading(device: DeviceLabel, temperature: f64) -> Reading {
    // Mid-January morning; no timezone has a DST jump at this wall time.
    let taken_at = Local.with_ymd_and_hms(2025, 1, 15, 8, 30, 5).unwrap();
    Reading::at(taken_at, device, "garage".to_string(), temperature)
}

#[test]
fn test_exact_payload_with_ordinal_device() {
    let record = PublishRecord::from_reading(&fixed_reading(DeviceLabel::Ordinal(1), 21.5));
    assert_eq!(
        record.to_json().unwrap(),
        r#"{"topic":"TEMPER","dateTime":"2025-01-15T08:30:05","device":1,"location":"garage","temperature":21.5}"#
    );
}

#[test]
fn test_exact_payload_with_named_device() {
    let record = PublishRecord::from_reading(&fixed_reading(
        DeviceLabel::Name("attic-probe".to_string()),
        21.04,
    ));
    assert_eq!(
        record.to_json().unwrap(),
        r#"{"topic":"TEMPER","dateTime":"2025-01-15T08:30:05","device":"attic-probe","location":"garage","temperature":21.0}"#
    );
}

#[test]
fn test_degraded_reading_payload_is_plain_zero() {
    let record = PublishRecord::from_reading(&fixed_reading(DeviceLabel::Ordinal(1), 0.0));
    assert!(record.to_json().unwrap().ends_with("\"temperature\":0.0}"));
}

#[test]
fn test_key_order_is_stable() {
    let json = PublishRecord::from_reading(&fixed_reading(DeviceLabel::Ordinal(2), 19.95))
        .to_json()
        .unwrap();

    let positions: Vec<usize> = ["\"topic\"", "\"dateTime\"", "\"device\"", "\"location\"", "\"temperature\""]
        .iter()
        .map(|key| json.find(key).expect("key missing"))
        .collect();

    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{json}");
}

#[test]
fn test_round_trip_preserves_label_shape() {
    let record = PublishRecord::from_reading(&fixed_reading(DeviceLabel::Ordinal(3), 18.2));
    let json = record.to_json().unwrap();
    let parsed: PublishRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
    assert_eq!(parsed.device, DeviceLabel::Ordinal(3));
}
