//! MQTT broker discovery over mDNS
//!
//! Fallback for hosts where no broker address is configured: browse for
//! `_mqtt._tcp` and take the first service that resolves within the budget.
//! Discovery failing is not an error here; the caller decides whether it can
//! run without a broker.

use mdns_sd::{ServiceDaemon, ServiceEvent};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// DNS-SD service type MQTT brokers advertise under.
pub const SERVICE_TYPE: &str = "_mqtt._tcp.local.";

/// How long a browse waits before giving up.
pub const DISCOVERY_BUDGET: Duration = Duration::from_secs(5);

/// Poll granularity within the budget.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A resolved broker advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerService {
    /// Full mDNS service name
    pub name: String,
    /// Resolved address, rendered for the MQTT client
    pub host: String,
    /// Advertised port
    pub port: u16,
}

/// Browse for an MQTT broker, returning the first one that resolves.
///
/// Returns `None` when the budget elapses or the mDNS stack is unusable.
pub fn discover_broker(budget: Duration) -> Option<BrokerService> {
    let mdns = match ServiceDaemon::new() {
        Ok(daemon) => daemon,
        Err(e) => {
            warn!("mDNS daemon unavailable: {}", e);
            return None;
        }
    };

    let receiver = match mdns.browse(SERVICE_TYPE) {
        Ok(receiver) => receiver,
        Err(e) => {
            warn!("mDNS browse for {} failed: {}", SERVICE_TYPE, e);
            let _ = mdns.shutdown();
            return None;
        }
    };

    info!("Browsing for {} ({}s budget)", SERVICE_TYPE, budget.as_secs());

    let deadline = Instant::now() + budget;
    let mut found = None;

    while Instant::now() < deadline {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(ServiceEvent::ServiceResolved(service)) => {
                // Prefer IPv4; a v4 host:port string stays unambiguous when
                // joined back together for the MQTT client.
                let addresses = service.get_addresses();
                let Some(address) = addresses
                    .iter()
                    .find(|a| a.is_ipv4())
                    .or_else(|| addresses.iter().next())
                    .copied()
                else {
                    debug!("{} resolved without addresses", service.get_fullname());
                    continue;
                };

                found = Some(BrokerService {
                    name: service.get_fullname().to_string(),
                    host: address.to_string(),
                    port: service.get_port(),
                });
                break;
            }
            Ok(ServiceEvent::ServiceFound(_, fullname)) => {
                debug!("Found {}, waiting for it to resolve", fullname);
            }
            Ok(_) => {}
            Err(_) => {
                // Poll timeout; the budget check decides when to stop.
            }
        }
    }

    let _ = mdns.shutdown();

    if found.is_none() {
        debug!("No broker resolved within the budget");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_is_fully_qualified() {
        // mdns-sd requires the trailing ".local." domain.
        assert!(SERVICE_TYPE.starts_with("_mqtt._tcp"));
        assert!(SERVICE_TYPE.ends_with(".local."));
    }

    #[test]
    fn test_discovery_with_tiny_budget_returns_quickly() {
        // A 1ms budget cannot resolve anything; this pins the no-broker path
        // and that the browse does not block past its budget by much.
        let started = Instant::now();
        let result = discover_broker(Duration::from_millis(1));
        assert!(result.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
