//! Published record types
//!
//! Defines the JSON object the daemon publishes per reading and the pieces
//! it is assembled from. The wire form is consumed by downstream collectors
//! that compare payloads as text, so field order, the timestamp format and
//! the one-decimal rounding are all part of the contract here.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic label stamped into every record.
pub const TOPIC: &str = "TEMPER";

/// Local wall-clock timestamp, whole seconds.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Identifies which sensor a record came from.
///
/// Serializes untagged: an ordinal becomes a JSON number, a name becomes a
/// JSON string. Existing consumers rely on seeing plain `1`, not `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceLabel {
    Ordinal(u32),
    Name(String),
}

impl DeviceLabel {
    /// Parse a command line or config value: numeric text becomes an
    /// ordinal, anything else is kept as a name.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(ordinal) => DeviceLabel::Ordinal(ordinal),
            Err(_) => DeviceLabel::Name(text.to_string()),
        }
    }
}

impl Default for DeviceLabel {
    fn default() -> Self {
        DeviceLabel::Ordinal(1)
    }
}

impl fmt::Display for DeviceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceLabel::Ordinal(ordinal) => write!(f, "{}", ordinal),
            DeviceLabel::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<u32> for DeviceLabel {
    fn from(ordinal: u32) -> Self {
        DeviceLabel::Ordinal(ordinal)
    }
}

/// One measurement with everything needed to publish it
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device: DeviceLabel,
    pub location: String,
    pub temperature: f64,
    pub taken_at: DateTime<Local>,
}

impl Reading {
    /// Capture a reading timestamped now.
    pub fn new(device: DeviceLabel, location: String, temperature: f64) -> Self {
        Self::at(Local::now(), device, location, temperature)
    }

    /// Build a reading with an explicit timestamp.
    pub fn at(
        taken_at: DateTime<Local>,
        device: DeviceLabel,
        location: String,
        temperature: f64,
    ) -> Self {
        Self {
            device,
            location,
            temperature,
            taken_at,
        }
    }
}

/// The JSON object published per reading.
///
/// Field order is the wire order; serde emits struct fields as declared, so
/// these stay exactly as listed: topic, dateTime, device, location,
/// temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub topic: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
    pub device: DeviceLabel,
    pub location: String,
    pub temperature: f64,
}

impl PublishRecord {
    /// Snapshot a reading into its wire form.
    ///
    /// The timestamp is rendered in local time without sub-second digits and
    /// the temperature is rounded to one decimal, halves away from zero.
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            topic: TOPIC.to_string(),
            date_time: reading.taken_at.format(TIMESTAMP_FORMAT).to_string(),
            device: reading.device.clone(),
            location: reading.location.clone(),
            temperature: round1(reading.temperature),
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
