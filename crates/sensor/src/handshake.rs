//! Device initialization handshake
//!
//! The sensor ignores GET_REPORT requests until it has been walked through a
//! fixed sequence of vendor SET_REPORT writes. The payloads below were
//! replayed verbatim from the vendor driver's USB traffic; the firmware
//! rejects reads unless it sees the whole sequence, including the sevenfold
//! zero-filled flush.

use crate::error::{Result, SensorError};
use rusb::{Context, DeviceHandle, Direction, Recipient, RequestType};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// HID SET_REPORT class request.
const SET_REPORT: u8 = 0x09;
/// wValue selecting output report 0 (report type 2 in the high byte).
const HANDSHAKE_VALUE: u16 = 0x0200;
/// wIndex of the sensor interface.
const HANDSHAKE_INDEX: u16 = 0x0001;
/// Handshake writes finish in single-digit milliseconds on a healthy device.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Number of zero-filled flush writes between the command and commit steps.
pub const FLUSH_REPEATS: u8 = 7;

/// Pad an 8-byte payload head out to the 32-byte report the firmware expects.
const fn padded(head: [u8; 8]) -> [u8; 32] {
    let mut report = [0u8; 32];
    let mut i = 0;
    while i < head.len() {
        report[i] = head[i];
        i += 1;
    }
    report
}

/// Opens a measurement session (mode byte 2).
const HELLO: [u8; 32] = padded([0x0a, 0x0b, 0x0c, 0x0d, 0x00, 0x00, 0x02, 0x00]);
/// Selects the temperature report.
const COMMAND: [u8; 32] = padded([0x54, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
/// Zero filler, sent [`FLUSH_REPEATS`] times.
const FLUSH: [u8; 32] = padded([0x00; 8]);
/// Closes the session (mode byte 1) and arms the sensor for reads.
const COMMIT: [u8; 32] = padded([0x0a, 0x0b, 0x0c, 0x0d, 0x00, 0x00, 0x01, 0x00]);

/// Identifies which handshake write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    Hello,
    Command,
    Flush { attempt: u8 },
    Commit,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStep::Hello => write!(f, "hello"),
            HandshakeStep::Command => write!(f, "command"),
            HandshakeStep::Flush { attempt } => write!(f, "flush {}/{}", attempt, FLUSH_REPEATS),
            HandshakeStep::Commit => write!(f, "commit"),
        }
    }
}

/// Run the full handshake against an opened, configured device.
///
/// Any failed write aborts the sequence; the device cannot be trusted to
/// report after a partial handshake.
pub(crate) fn run(handle: &DeviceHandle<Context>, ordinal: u32) -> Result<()> {
    send(handle, ordinal, HandshakeStep::Hello, &HELLO)?;
    send(handle, ordinal, HandshakeStep::Command, &COMMAND)?;
    for attempt in 1..=FLUSH_REPEATS {
        send(handle, ordinal, HandshakeStep::Flush { attempt }, &FLUSH)?;
    }
    send(handle, ordinal, HandshakeStep::Commit, &COMMIT)?;
    debug!("Handshake complete on device {}", ordinal);
    Ok(())
}

fn send(
    handle: &DeviceHandle<Context>,
    ordinal: u32,
    step: HandshakeStep,
    report: &[u8; 32],
) -> Result<()> {
    let request_type =
        rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface);

    debug!("Handshake write ({}) on device {}", step, ordinal);

    handle
        .write_control(
            request_type,
            SET_REPORT,
            HANDSHAKE_VALUE,
            HANDSHAKE_INDEX,
            report,
            WRITE_TIMEOUT,
        )
        .map_err(|source| SensorError::Handshake {
            ordinal,
            step,
            source,
        })?;

    Ok(())
}
