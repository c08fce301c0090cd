//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).  Each
//! event is one line with a fixed tag so serial captures can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(marker) => {
                info!("START | record={:?}", marker);
            }
            AppEvent::NetworkConnected { ssid, address } => {
                info!("NET   | joined '{}' ip={}", ssid, address);
            }
            AppEvent::NetworkLost => {
                warn!("NET   | link lost, reconnect queued");
            }
            AppEvent::BrokerConnected { address, port } => {
                info!("MQTT  | connected {}:{}", address, port);
            }
            AppEvent::ConnectivityFailed(e) => {
                warn!("LINK  | {}", e);
            }
            AppEvent::ConfigRolledBack => {
                warn!("CFG   | staged changes rolled back");
            }
            AppEvent::ConfigCommitted => {
                info!("CFG   | committed");
            }
            AppEvent::PersistenceFailed(e) => {
                warn!("CFG   | commit failed: {}, record left staged", e);
            }
            AppEvent::ThresholdsUpdated(t) => {
                info!(
                    "DHT   | offset={} t_hold={:.1} h_hold={}",
                    t.temp_offset, t.temp_level, t.hum_level
                );
            }
            AppEvent::Rejected(e) => {
                warn!("REJ   | {}", e);
            }
            AppEvent::ZoneStarted { zone, minutes } => {
                info!("WATER | zone={} minutes={}", zone, minutes);
            }
            AppEvent::ProgramStarted(p) => {
                info!("WATER | program={}", p);
            }
            AppEvent::Climate(s) => {
                info!(
                    "DHT   | T={:.1}\u{00b0}C RH={:.1}%",
                    s.temperature, s.humidity
                );
            }
        }
    }
}
