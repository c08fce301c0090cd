//! MQTT broker adapter.
//!
//! Implements [`BrokerPort`].  Inbound `<prefix>/config` payloads are not
//! handled here: the client callback copies them into [`INBOX`], a bounded
//! channel that the main loop drains into
//! [`UpdateDispatcher::intake`](crate::app::dispatcher::UpdateDispatcher::intake).
//! The callback never touches the dispatcher or the store.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` from `esp_idf_svc::mqtt`.
//! - **all other targets**: simulation that records published payloads.

use core::net::Ipv4Addr;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands::MAX_PAYLOAD_LEN;
use crate::app::ports::BrokerPort;
use crate::app::status::StatusReport;
use crate::config::TOPIC_PREFIX;
use crate::error::ConnectivityError;

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
};

/// One raw inbound payload.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

const INBOX_DEPTH: usize = 4;

/// Payloads received on the config topic, oldest first.
pub static INBOX: Channel<CriticalSectionRawMutex, Payload, INBOX_DEPTH> = Channel::new();

/// How long `connect` waits for the broker's CONNACK.
#[cfg(target_os = "espidf")]
const CONNACK_TIMEOUT_MS: u32 = 3_000;
#[cfg(target_os = "espidf")]
const CONNACK_POLL_MS: u32 = 50;

#[cfg(target_os = "espidf")]
static CONNECTED: AtomicBool = AtomicBool::new(false);
/// Raised by the callback on every (re)connect; cleared once the config
/// topic has been subscribed again.
#[cfg(target_os = "espidf")]
static NEEDS_SUBSCRIBE: AtomicBool = AtomicBool::new(false);

pub fn config_topic() -> String {
    format!("{}/config", TOPIC_PREFIX)
}

pub fn value_topic() -> String {
    format!("{}/value", TOPIC_PREFIX)
}

/// Queue an inbound payload.  Oversized payloads and overflow are dropped.
pub fn deliver(data: &[u8]) -> bool {
    let Ok(payload) = Payload::from_slice(data) else {
        warn!("mqtt: dropping oversized payload ({} bytes)", data.len());
        return false;
    };
    if INBOX.try_send(payload).is_err() {
        warn!("mqtt: inbox full, payload dropped");
        return false;
    }
    true
}

/// Next queued payload, if any.
pub fn take_inbound() -> Option<Payload> {
    INBOX.try_receive().ok()
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    client_id: &'static str,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// Host-side stand-in for the broker session.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimBroker {
    reachable: bool,
    connected: bool,
    endpoint: Option<(Ipv4Addr, u16)>,
    published: Vec<String>,
}

impl MqttAdapter {
    pub fn new(client_id: &'static str) -> Self {
        Self {
            client_id,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                reachable: true,
                connected: false,
                endpoint: None,
                published: Vec::new(),
            },
        }
    }
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    /// Re-subscribe after the client reconnected on its own.  Call once per
    /// loop iteration.
    pub fn poll(&mut self) {
        if !NEEDS_SUBSCRIBE.load(Ordering::Acquire) {
            return;
        }
        if let Some(client) = self.client.as_mut() {
            match client.subscribe(&config_topic(), QoS::AtMostOnce) {
                Ok(_) => {
                    NEEDS_SUBSCRIBE.store(false, Ordering::Release);
                    info!("mqtt: subscribed to {}", config_topic());
                }
                Err(e) => warn!("mqtt: subscribe failed: {}", e),
            }
        }
    }

    fn open(&mut self, address: Ipv4Addr, port: u16) -> Result<(), ConnectivityError> {
        // Dropping the old client tears its session down.
        self.client = None;
        CONNECTED.store(false, Ordering::Release);

        let url = format!("mqtt://{}:{}", address, port);
        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id),
            ..Default::default()
        };
        let client = EspMqttClient::new_cb(&url, &conf, |event| match event.payload() {
            EventPayload::Connected(_) => {
                CONNECTED.store(true, Ordering::Release);
                NEEDS_SUBSCRIBE.store(true, Ordering::Release);
            }
            EventPayload::Disconnected => CONNECTED.store(false, Ordering::Release),
            EventPayload::Received {
                topic, data, details, ..
            } => {
                if matches!(details, Details::Complete)
                    && topic.is_none_or(|t| t == config_topic())
                {
                    deliver(data);
                }
            }
            _ => {}
        })
        .map_err(|e| {
            warn!("mqtt: client for {} not created: {}", url, e);
            ConnectivityError::BrokerFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !CONNECTED.load(Ordering::Acquire) {
            if waited >= CONNACK_TIMEOUT_MS {
                self.client = None;
                return Err(ConnectivityError::BrokerFailed);
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited += CONNACK_POLL_MS;
        }
        self.poll();
        Ok(())
    }

    fn send(&mut self, body: &str) -> Result<(), ConnectivityError> {
        let client = self.client.as_mut().ok_or(ConnectivityError::NotConnected)?;
        client
            .enqueue(&value_topic(), QoS::AtMostOnce, false, body.as_bytes())
            .map(|_| ())
            .map_err(|_| ConnectivityError::NotConnected)
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    fn open(&mut self, address: Ipv4Addr, port: u16) -> Result<(), ConnectivityError> {
        self.sim.connected = self.sim.reachable;
        if !self.sim.connected {
            return Err(ConnectivityError::BrokerFailed);
        }
        self.sim.endpoint = Some((address, port));
        Ok(())
    }

    fn send(&mut self, body: &str) -> Result<(), ConnectivityError> {
        self.sim.published.push(body.to_string());
        Ok(())
    }

    /// Make later connects succeed or fail; `false` also drops the session.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
        if !reachable {
            self.sim.connected = false;
        }
    }

    pub fn endpoint(&self) -> Option<(Ipv4Addr, u16)> {
        self.sim.endpoint
    }

    /// JSON bodies published so far.
    pub fn published(&self) -> &[String] {
        &self.sim.published
    }
}

// ───────────────────────────────────────────────────────────────
// BrokerPort
// ───────────────────────────────────────────────────────────────

impl BrokerPort for MqttAdapter {
    fn connect(&mut self, address: Ipv4Addr, port: u16) -> Result<(), ConnectivityError> {
        info!("mqtt: '{}' connecting to {}:{}", self.client_id, address, port);
        self.open(address, port)?;
        info!("mqtt: connected, listening on {}", config_topic());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn is_connected(&self) -> bool {
        self.client.is_some() && CONNECTED.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_connected(&self) -> bool {
        self.sim.connected
    }

    fn publish(&mut self, report: &StatusReport) -> Result<(), ConnectivityError> {
        if !self.is_connected() {
            return Err(ConnectivityError::NotConnected);
        }
        let body = report
            .to_json()
            .map_err(|_| ConnectivityError::NotConnected)?;
        self.send(&body)?;
        info!("mqtt: {} <- {}", value_topic(), body);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
