//! Mock adapters for integration tests.
//!
//! Every mock records its calls so tests can assert on the full history
//! without touching WiFi, MQTT, flash or GPIO.  Failures are injected by
//! flipping public fields.

use core::net::Ipv4Addr;
use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use hunterbridge::app::dispatcher::UpdateDispatcher;
use hunterbridge::app::events::AppEvent;
use hunterbridge::app::ports::{
    ActuatorPort, BrokerPort, EventSink, NetworkPort, StorageError, StoragePort,
};
use hunterbridge::app::status::StatusReport;
use hunterbridge::config::{BridgeConfig, LinkDefaults};
use hunterbridge::error::ConnectivityError;
use hunterbridge::protocol::Frame;
use hunterbridge::store::record::{PersistedConfig, RECORD_LEN};
use hunterbridge::store::{ConfigStore, KEY, NAMESPACE};

pub const HOME_SSID: &str = "HomeNet";
pub const HOME_PASS: &str = "secret";
pub const HOME_BROKER: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 10);
pub const ASSIGNED_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 42);

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    pub up: bool,
    /// Number of upcoming join attempts that fail.
    pub failures_left: u32,
    /// SSIDs of every join attempt, in order.
    pub calls: Vec<String>,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn new() -> Self {
        Self {
            up: false,
            failures_left: 0,
            calls: Vec::new(),
        }
    }

    pub fn last_ssid(&self) -> Option<&str> {
        self.calls.last().map(String::as_str)
    }
}

impl NetworkPort for MockNetwork {
    fn connect(&mut self, ssid: &str, _passphrase: &str) -> Result<Ipv4Addr, ConnectivityError> {
        self.calls.push(ssid.to_string());
        if self.failures_left > 0 {
            self.failures_left -= 1;
            self.up = false;
            return Err(ConnectivityError::NetworkFailed);
        }
        self.up = true;
        Ok(ASSIGNED_IP)
    }

    fn is_connected(&self) -> bool {
        self.up
    }
}

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    pub up: bool,
    pub reachable: bool,
    /// Endpoint of every connect attempt, in order.
    pub attempts: Vec<(Ipv4Addr, u16)>,
    /// Every publish attempt, delivered or not.
    pub publish_attempts: Vec<StatusReport>,
    /// Reports that reached the broker.
    pub published: Vec<StatusReport>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            up: false,
            reachable: true,
            attempts: Vec::new(),
            publish_attempts: Vec::new(),
            published: Vec::new(),
        }
    }

    /// Broker goes away: the session drops and reconnects fail.
    pub fn go_down(&mut self) {
        self.up = false;
        self.reachable = false;
    }
}

impl BrokerPort for MockBroker {
    fn connect(&mut self, address: Ipv4Addr, port: u16) -> Result<(), ConnectivityError> {
        self.attempts.push((address, port));
        self.up = self.reachable;
        if self.up {
            Ok(())
        } else {
            Err(ConnectivityError::BrokerFailed)
        }
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn publish(&mut self, report: &StatusReport) -> Result<(), ConnectivityError> {
        self.publish_attempts.push(report.clone());
        if !self.up {
            return Err(ConnectivityError::NotConnected);
        }
        self.published.push(report.clone());
        Ok(())
    }
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Transmit(Frame),
    SetPump(bool),
}

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn frames(&self) -> Vec<&Frame> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Transmit(f) => Some(f),
                ActuatorCall::SetPump(_) => None,
            })
            .collect()
    }

    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetPump(on) => Some(*on),
                ActuatorCall::Transmit(_) => None,
            })
            .unwrap_or(false)
    }
}

impl ActuatorPort for MockHardware {
    fn transmit(&mut self, frame: &Frame) {
        self.calls.push(ActuatorCall::Transmit(frame.clone()));
    }

    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetPump(on));
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: u32,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            fail_writes: false,
            writes: 0,
        }
    }

    /// Raw bytes of the configuration record, if one was ever written.
    pub fn record(&self) -> Option<[u8; RECORD_LEN]> {
        let bytes = self.store.get(&format!("{}::{}", NAMESPACE, KEY))?;
        bytes.as_slice().try_into().ok()
    }

    /// Decoded configuration record.
    pub fn config(&self) -> Option<PersistedConfig> {
        PersistedConfig::from_record(&self.record()?)
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }
}

// ── MockDelay ─────────────────────────────────────────────────

/// Accumulates requested sleep time instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembly ──────────────────────────────────────────────────

pub type TestBridge = UpdateDispatcher<MockNvs, MockNetwork, MockBroker, MockHardware, MockDelay>;

pub fn link_defaults() -> LinkDefaults {
    LinkDefaults {
        ssid: HOME_SSID,
        passphrase: HOME_PASS,
        broker_ip: HOME_BROKER,
        broker_port: 1883,
    }
}

/// Dispatcher over fresh mocks with default timing; nothing connected yet.
pub fn bridge() -> (TestBridge, RecordingSink) {
    bridge_with(MockNvs::new(), &BridgeConfig::default())
}

pub fn bridge_with(nvs: MockNvs, config: &BridgeConfig) -> (TestBridge, RecordingSink) {
    let store = ConfigStore::open(nvs, link_defaults());
    let mut d = UpdateDispatcher::new(
        store,
        MockNetwork::new(),
        MockBroker::new(),
        MockHardware::new(),
        MockDelay::default(),
        config,
    );
    let mut sink = RecordingSink::new();
    d.start(&mut sink);
    (d, sink)
}

/// Dispatcher with both links up and the default record committed.
#[allow(dead_code)]
pub fn online() -> (TestBridge, RecordingSink) {
    let (mut d, mut sink) = bridge();
    d.step(&mut sink);
    d.step(&mut sink);
    assert!(d.network().is_connected());
    assert!(d.broker().is_connected());
    sink.clear();
    (d, sink)
}
