//! Sensor error types

use crate::handshake::HandshakeStep;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("USB context initialization failed: {0}")]
    Context(#[source] rusb::Error),

    #[error("USB enumeration failed: {0}")]
    Enumeration(#[source] rusb::Error),

    #[error("failed to open device {ordinal}: {source}")]
    Open {
        ordinal: u32,
        #[source]
        source: rusb::Error,
    },

    #[error("failed to select configuration 1 on device {ordinal}: {source}")]
    Configuration {
        ordinal: u32,
        #[source]
        source: rusb::Error,
    },

    #[error("handshake transfer ({step}) failed on device {ordinal}: {source}")]
    Handshake {
        ordinal: u32,
        step: HandshakeStep,
        #[source]
        source: rusb::Error,
    },
}

pub type Result<T> = std::result::Result<T, SensorError>;
