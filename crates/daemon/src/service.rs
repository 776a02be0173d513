//! Systemd service integration
//!
//! Implements the sd-notify handshake so the unit can use Type=notify and
//! show publishing status in `systemctl status`. All functions are no-ops
//! when NOTIFY_SOCKET is absent, so running from a shell behaves the same.

use anyhow::{Context, Result};
use std::env;
use std::os::unix::net::UnixDatagram;
use tracing::{debug, info};

/// Notify systemd that the daemon is ready
///
/// Called once the sensors are initialized and the broker connection is up.
pub fn notify_ready() -> Result<()> {
    if let Ok(socket_path) = env::var("NOTIFY_SOCKET") {
        let socket = UnixDatagram::unbound().context("Failed to create Unix socket")?;
        socket
            .send_to(b"READY=1", &socket_path)
            .context("Failed to send READY notification to systemd")?;
        info!("Notified systemd: service ready");
        Ok(())
    } else {
        debug!("NOTIFY_SOCKET not set, skipping systemd notification");
        Ok(())
    }
}

/// Send a status line to systemd
///
/// The status shows up in `systemctl status` output.
pub fn notify_status(status: &str) -> Result<()> {
    if let Ok(socket_path) = env::var("NOTIFY_SOCKET") {
        let socket = UnixDatagram::unbound().context("Failed to create Unix socket")?;
        let message = format!("STATUS={}", status);
        socket
            .send_to(message.as_bytes(), &socket_path)
            .context("Failed to send STATUS notification to systemd")?;
        debug!("Notified systemd: status = {}", status);
        Ok(())
    } else {
        debug!("NOTIFY_SOCKET not set, skipping systemd notification");
        Ok(())
    }
}

/// Check if running under systemd
pub fn is_systemd() -> bool {
    env::var("NOTIFY_SOCKET").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_systemd_without_socket() {
        unsafe {
            env::remove_var("NOTIFY_SOCKET");
        }
        assert!(!is_systemd());
    }

    #[test]
    fn test_notify_functions_without_socket() {
        // Without NOTIFY_SOCKET the notifications succeed but do nothing.
        unsafe {
            env::remove_var("NOTIFY_SOCKET");
        }

        assert!(notify_ready().is_ok());
        assert!(notify_status("test").is_ok());
    }
}
