//! Daemon configuration management

use anyhow::{Context, Result, anyhow};
use sensor::{DEFAULT_CALIBRATION_OFFSET, Unit};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub sensor: SensorSettings,
    #[serde(default)]
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Default log level when RUST_LOG is not set
    #[serde(default = "DaemonSettings::default_log_level")]
    pub log_level: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl DaemonSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Broker address, host or host:port. Discovered over mDNS when unset
    /// and not given on the command line.
    #[serde(default)]
    pub address: Option<String>,
    /// Topic records are published to
    #[serde(default = "BrokerSettings::default_topic")]
    pub topic: String,
    /// MQTT QoS level (0, 1 or 2)
    #[serde(default)]
    pub qos: u8,
    /// Client id prefix; a random suffix is appended per run so several
    /// daemons can share a broker without kicking each other off.
    #[serde(default = "BrokerSettings::default_client_id_prefix")]
    pub client_id_prefix: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            address: None,
            topic: Self::default_topic(),
            qos: 0,
            client_id_prefix: Self::default_client_id_prefix(),
        }
    }
}

impl BrokerSettings {
    fn default_topic() -> String {
        telemetry::TOPIC.to_string()
    }

    fn default_client_id_prefix() -> String {
        "temper-mqtt".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSettings {
    /// Additive calibration in raw sensor counts
    #[serde(default = "SensorSettings::default_calibration_offset")]
    pub calibration_offset: i32,
    /// Unit readings are decoded into (celsius, fahrenheit, kelvin)
    #[serde(default)]
    pub unit: Unit,
    /// Timeout for a single report read, in milliseconds
    #[serde(default = "SensorSettings::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            calibration_offset: Self::default_calibration_offset(),
            unit: Unit::Celsius,
            read_timeout_ms: Self::default_read_timeout_ms(),
        }
    }
}

impl SensorSettings {
    fn default_calibration_offset() -> i32 {
        DEFAULT_CALIBRATION_OFFSET
    }

    fn default_read_timeout_ms() -> u64 {
        5000
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Device label stamped into records (ordinal or free-form name)
    #[serde(default = "PublishSettings::default_device")]
    pub device: String,
    /// Location label stamped into records
    #[serde(default = "PublishSettings::default_location")]
    pub location: String,
    /// Additive correction in degrees, applied after decoding
    #[serde(default)]
    pub correction: f64,
    /// Seconds between publish cycles
    #[serde(default = "PublishSettings::default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            device: Self::default_device(),
            location: Self::default_location(),
            correction: 0.0,
            interval_secs: Self::default_interval_secs(),
        }
    }
}

impl PublishSettings {
    fn default_device() -> String {
        "1".to_string()
    }

    fn default_location() -> String {
        "UNKNOWN".to_string()
    }

    fn default_interval_secs() -> u64 {
        60
    }
}

impl DaemonConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/temper-mqtt/config.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("temper-mqtt").join("config.toml")
        } else {
            PathBuf::from(".config/temper-mqtt/config.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.daemon.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.daemon.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.broker.qos > 2 {
            return Err(anyhow!(
                "Invalid QoS {}, must be 0, 1 or 2",
                self.broker.qos
            ));
        }

        if self.broker.topic.is_empty() {
            return Err(anyhow!("Publish topic must not be empty"));
        }

        if self.publish.interval_secs == 0 {
            return Err(anyhow!("Publish interval must be at least 1 second"));
        }

        // A zero libusb timeout means wait forever; a stuck sensor would then
        // wedge the whole publish loop.
        if self.sensor.read_timeout_ms == 0 {
            return Err(anyhow!("Sensor read timeout must be at least 1 ms"));
        }

        // 32768 counts of trim is 128 degrees; anything past that is a typo,
        // not a calibration.
        if !(-32768..=32768).contains(&self.sensor.calibration_offset) {
            return Err(anyhow!(
                "Calibration offset {} out of range, must be between -32768 and 32768",
                self.sensor.calibration_offset
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.broker.address, None);
        assert_eq!(config.broker.topic, "TEMPER");
        assert_eq!(config.broker.qos, 0);
        assert_eq!(config.sensor.calibration_offset, 15);
        assert_eq!(config.sensor.unit, Unit::Celsius);
        assert_eq!(config.sensor.read_timeout_ms, 5000);
        assert_eq!(config.publish.device, "1");
        assert_eq!(config.publish.location, "UNKNOWN");
        assert_eq!(config.publish.correction, 0.0);
        assert_eq!(config.publish.interval_secs, 60);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(DaemonConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.publish.interval_secs, 60);
        assert_eq!(config.broker.topic, "TEMPER");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [broker]
            address = "mqtt.lan"

            [publish]
            location = "garage"
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.address.as_deref(), Some("mqtt.lan"));
        assert_eq!(config.broker.qos, 0);
        assert_eq!(config.publish.location, "garage");
        assert_eq!(config.publish.device, "1");
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = DaemonConfig::default();
        assert!(config.validate().is_ok());

        config.daemon.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.daemon.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_qos() {
        let mut config = DaemonConfig::default();
        config.broker.qos = 2;
        assert!(config.validate().is_ok());

        config.broker.qos = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_intervals() {
        let mut config = DaemonConfig::default();
        config.publish.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.sensor.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_calibration_offset_window() {
        let mut config = DaemonConfig::default();
        config.sensor.calibration_offset = 32768;
        assert!(config.validate().is_ok());

        config.sensor.calibration_offset = -32768;
        assert!(config.validate().is_ok());

        config.sensor.calibration_offset = 32769;
        assert!(config.validate().is_err());

        config.sensor.calibration_offset = i32::MAX;
        assert!(config.validate().is_err());

        config.sensor.calibration_offset = i32::MIN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: DaemonConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.daemon.log_level, parsed.daemon.log_level);
        assert_eq!(config.sensor.calibration_offset, parsed.sensor.calibration_offset);
        assert_eq!(config.publish.interval_secs, parsed.publish.interval_secs);
    }

    #[test]
    fn test_unit_parses_lowercase() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [sensor]
            unit = "fahrenheit"
            "#,
        )
        .unwrap();
        assert_eq!(config.sensor.unit, Unit::Fahrenheit);
    }
}
