//! Publish loop
//!
//! One cycle reads every sensor, applies the configured correction, wraps
//! each value in a wire record and hands it to the sink. The loop has no
//! termination condition of its own; per-reading problems are logged and the
//! cycle moves on.

use crate::transport::MessageSink;
use sensor::TemperatureSource;
use std::time::Duration;
use telemetry::{DeviceLabel, PublishRecord, Reading};
use tracing::{debug, info, warn};

/// What the loop stamps into records and how often it runs
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    /// Device label for published records
    pub device: DeviceLabel,
    /// Location label for published records
    pub location: String,
    /// Additive correction in degrees, applied on top of decoded values
    pub correction: f64,
    /// Topic to publish to
    pub topic: String,
    /// QoS for publishes
    pub qos: u8,
    /// Pause between cycles
    pub interval: Duration,
}

/// Periodic reader-and-publisher over a source and a sink
pub struct Publisher<S, T> {
    source: S,
    sink: T,
    settings: PublisherSettings,
}

impl<S: TemperatureSource, T: MessageSink> Publisher<S, T> {
    pub fn new(source: S, sink: T, settings: PublisherSettings) -> Self {
        Self {
            source,
            sink,
            settings,
        }
    }

    /// Read and publish every sensor once.
    ///
    /// Returns how many records made it to the sink. The correction applies
    /// to whatever the source returned, degraded 0.0 readings included; a
    /// reading stamped with the correction alone is still useful evidence of
    /// a flapping sensor downstream.
    pub fn run_cycle(&mut self) -> usize {
        let mut published = 0;

        for index in 0..self.source.device_count() {
            let temperature = self.source.read_temperature(index) + self.settings.correction;
            let reading = Reading::new(
                self.settings.device.clone(),
                self.settings.location.clone(),
                temperature,
            );
            let record = PublishRecord::from_reading(&reading);

            let payload = match record.to_json() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Failed to serialize record: {}", e);
                    continue;
                }
            };

            debug!("Publishing to {}: {}", self.settings.topic, payload);
            match self
                .sink
                .publish(&self.settings.topic, &payload, self.settings.qos)
            {
                Ok(()) => published += 1,
                Err(e) => warn!("Publish failed: {}", e),
            }
        }

        published
    }

    /// Run cycles forever, sleeping the configured interval between them.
    pub fn run(&mut self) -> ! {
        info!(
            "Publishing {} sensor(s) every {}s",
            self.source.device_count(),
            self.settings.interval.as_secs()
        );

        loop {
            let published = self.run_cycle();
            debug!(
                "Cycle complete, {} record(s) published; sleeping {}s",
                published,
                self.settings.interval.as_secs()
            );
            std::thread::sleep(self.settings.interval);
        }
    }
}
