//! Outbound application events.
//!
//! The [`UpdateDispatcher`](super::dispatcher::UpdateDispatcher) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to serial, record in a test.

use core::net::Ipv4Addr;

use heapless::String;

use crate::error::{ConnectivityError, Error, StoreError};
use crate::sensors::climate::ClimateSample;
use crate::store::record::{Marker, SSID_MAX, SensorThresholds};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The dispatcher was built; carries the marker of the loaded record.
    Started(Marker),

    /// WiFi joined.
    NetworkConnected {
        ssid: String<SSID_MAX>,
        address: Ipv4Addr,
    },

    /// WiFi dropped; a reconnect has been queued.
    NetworkLost,

    /// MQTT session opened with the staged endpoint.
    BrokerConnected { address: Ipv4Addr, port: u16 },

    /// A connect attempt sequence gave up.
    ConnectivityFailed(ConnectivityError),

    /// Staged values were discarded after a failed broker connect.
    ConfigRolledBack,

    /// The durable record was written.
    ConfigCommitted,

    /// The durable write failed; the record stays staged.
    PersistenceFailed(StoreError),

    /// New climate thresholds are in effect.
    ThresholdsUpdated(SensorThresholds),

    /// An inbound section or pending command was refused.
    Rejected(Error),

    /// A zone frame went out on the bus.
    ZoneStarted { zone: i32, minutes: i32 },

    /// A program frame went out on the bus.
    ProgramStarted(i32),

    /// A climate reading was reported.
    Climate(ClimateSample),
}
