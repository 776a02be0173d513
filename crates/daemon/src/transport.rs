//! MQTT message transport
//!
//! Owns the rumqttc client plus the background thread that drives its
//! connection. The publisher only sees the [`MessageSink`] trait, which keeps
//! it testable without a broker.

use crate::config::BrokerSettings;
use rand::{Rng, distr::Alphanumeric};
use rumqttc::{Client, ConnectionError, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// MQTT port used when the address does not name one.
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Keep-alive interval offered to the broker.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Outgoing request queue depth; one reading per cycle never fills this.
const REQUEST_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid broker address '{0}'")]
    Address(String),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("failed to spawn connection thread: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything the publisher can hand records to.
pub trait MessageSink {
    /// Publish one payload to a topic at the given QoS level.
    fn publish(&mut self, topic: &str, payload: &str, qos: u8) -> Result<(), TransportError>;
}

/// MQTT-backed [`MessageSink`]
pub struct MqttTransport {
    client: Client,
}

impl MqttTransport {
    /// Connect to a broker given as `host` or `host:port`.
    ///
    /// The connection itself is driven by a background thread; this returns
    /// as soon as the client is queued to connect. Publishes made before the
    /// session is up are buffered by the client.
    pub fn connect(address: &str, settings: &BrokerSettings) -> Result<Self, TransportError> {
        let (host, port) = split_address(address)?;
        let client_id = random_client_id(&settings.client_id_prefix);

        info!("Connecting to MQTT broker {}:{} as {}", host, port, client_id);

        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut connection) = Client::new(options, REQUEST_QUEUE_CAPACITY);

        std::thread::Builder::new()
            .name("mqtt-connection".to_string())
            .spawn(move || {
                for event in connection.iter() {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("Connected to the MQTT broker");
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            // We never subscribe; a broker pushing messages at
                            // us means a misconfigured shared client id.
                            warn!("Not expecting inbound messages (topic '{}')", publish.topic);
                        }
                        Ok(_) => {}
                        Err(ConnectionError::RequestsDone) => {
                            debug!("Request queue closed, stopping connection loop");
                            break;
                        }
                        Err(e) => {
                            warn!("MQTT connection error: {}", e);
                            // The iterator reconnects on the next poll; don't
                            // spin while the broker is down.
                            std::thread::sleep(Duration::from_secs(1));
                        }
                    }
                }
            })?;

        Ok(Self { client })
    }

    /// Ask the broker for a clean disconnect.
    ///
    /// The publish loop runs until the process is killed, so nothing calls
    /// this today; it stays for embedders that stop the transport themselves.
    #[allow(dead_code)]
    pub fn disconnect(&mut self) -> Result<(), TransportError> {
        self.client.disconnect()?;
        Ok(())
    }
}

impl MessageSink for MqttTransport {
    fn publish(&mut self, topic: &str, payload: &str, qos: u8) -> Result<(), TransportError> {
        self.client
            .publish(topic, map_qos(qos), false, payload.as_bytes().to_vec())?;
        Ok(())
    }
}

/// Map a config QoS number onto the protocol level.
fn map_qos(qos: u8) -> QoS {
    match qos {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}

/// Split `host` or `host:port` into its parts.
fn split_address(address: &str) -> Result<(String, u16), TransportError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(TransportError::Address(address.to_string()));
    }

    // Bare IPv6 literals contain colons but no port syntax we support.
    if address.parse::<std::net::Ipv6Addr>().is_ok() {
        return Ok((address.to_string(), DEFAULT_MQTT_PORT));
    }

    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| TransportError::Address(address.to_string()))?;
            if host.is_empty() {
                return Err(TransportError::Address(address.to_string()));
            }
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), DEFAULT_MQTT_PORT)),
    }
}

/// Client id with a random suffix so concurrent daemons don't collide.
fn random_client_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{}-{}", prefix, suffix)
}
