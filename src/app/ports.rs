//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ UpdateDispatcher (domain)
//! ```
//!
//! Driven adapters (WiFi, MQTT, bus hardware, NVS, event sinks) implement
//! these traits.  The [`UpdateDispatcher`](super::dispatcher::UpdateDispatcher)
//! consumes them via generics, so the domain core never touches hardware
//! directly and host tests can substitute mocks.

use core::net::Ipv4Addr;

use crate::app::events::AppEvent;
use crate::app::status::StatusReport;
use crate::error::{ConnectivityError, SensorError};
use crate::protocol::Frame;
use crate::sensors::climate::ClimateSample;

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → WiFi station)
// ───────────────────────────────────────────────────────────────

/// Station-mode network link.
pub trait NetworkPort {
    /// Join the network with the given credentials.  One attempt; the
    /// dispatcher owns retrying.  Returns the assigned address.
    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<Ipv4Addr, ConnectivityError>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ MQTT)
// ───────────────────────────────────────────────────────────────

/// MQTT session towards the configured broker.
///
/// Inbound messages do not flow through this trait: the adapter queues
/// them and the main loop hands them to
/// [`UpdateDispatcher::intake`](super::dispatcher::UpdateDispatcher::intake).
pub trait BrokerPort {
    /// Open (or reopen) a session.  One attempt.
    fn connect(&mut self, address: Ipv4Addr, port: u16) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    /// Publish one status group on the value topic.
    fn publish(&mut self, report: &StatusReport) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → sprinkler hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the timer.
pub trait ActuatorPort {
    /// Send an encoded frame on the X-Core bus.  Blocks until done.
    fn transmit(&mut self, frame: &Frame);

    /// Switch the auxiliary pump relay (no-op when none is fitted).
    fn set_pump(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Climate sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait ClimateSensor {
    /// One raw reading, before offset correction.
    fn read(&mut self) -> Result<ClimateSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
