//! Wire records for temperature telemetry
//!
//! This crate defines the JSON records the daemon publishes and the rounding
//! and labelling rules that go with them. It knows nothing about USB or MQTT;
//! it only turns readings into bytes downstream collectors expect.
//!
//! # Example
//!
//! ```
//! use telemetry::{DeviceLabel, PublishRecord, Reading};
//!
//! let reading = Reading::new(DeviceLabel::parse("1"), "garage".to_string(), 21.04);
//! let record = PublishRecord::from_reading(&reading);
//! assert_eq!(record.temperature, 21.0);
//!
//! let json = record.to_json().unwrap();
//! assert!(json.starts_with("{\"topic\":\"TEMPER\",\"dateTime\":"));
//! ```

pub mod record;

pub use record::{DeviceLabel, PublishRecord, Reading, TOPIC, round1};
