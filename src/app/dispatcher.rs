//! Update dispatcher, the hexagonal core of the bridge.
//!
//! [`UpdateDispatcher`] owns the configuration store, the pending update
//! set and every driven port.  The main loop feeds it inbound payloads
//! through [`intake`](UpdateDispatcher::intake) and calls
//! [`step`](UpdateDispatcher::step) once per iteration.  Each step services
//! exactly one pending kind, highest priority first.
//!
//! ```text
//!  MQTT inbox ──▶ intake ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                            │   UpdateDispatcher    │
//!  NetworkPort ◀────────────▶│ pending · store      │──▶ ActuatorPort
//!  BrokerPort  ◀────────────▶│ retry policies       │
//!                            └──────────────────────┘
//! ```

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::commands::parse_config;
use crate::app::events::AppEvent;
use crate::app::pending::{PendingUpdate, PendingUpdateSet, ThresholdUpdate, ZoneRequest};
use crate::app::ports::{ActuatorPort, BrokerPort, EventSink, NetworkPort, StoragePort};
use crate::app::retry::RetryPolicy;
use crate::app::status::StatusReport;
use crate::config::BridgeConfig;
use crate::protocol::{encode_program, encode_zone};
use crate::sensors::climate::ClimateSample;
use crate::store::record::{Credentials, Endpoint, Marker};
use crate::store::{ConfigStore, FieldGroup};

/// What a single [`step`](UpdateDispatcher::step) serviced.  The
/// dispatcher is back in `Idle` when `step` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    NetworkPending,
    BrokerPending,
    ThresholdsPending,
    ZonePending,
    ProgramPending,
}

pub struct UpdateDispatcher<S, N, B, A, D> {
    store: ConfigStore<S>,
    network: N,
    broker: B,
    actuator: A,
    delay: D,
    pending: PendingUpdateSet,
    network_retry: RetryPolicy,
    broker_retry: RetryPolicy,
    /// Set after a failed broker attempt; suppresses the automatic
    /// reconnect for one step.
    broker_cooldown: bool,
    /// Threshold parameters committed while the broker was unreachable;
    /// published on the next successful broker connect.
    params_unpublished: bool,
    address: Option<Ipv4Addr>,
}

impl<S, N, B, A, D> UpdateDispatcher<S, N, B, A, D>
where
    S: StoragePort,
    N: NetworkPort,
    B: BrokerPort,
    A: ActuatorPort,
    D: DelayNs,
{
    pub fn new(
        store: ConfigStore<S>,
        network: N,
        broker: B,
        actuator: A,
        delay: D,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            store,
            network,
            broker,
            actuator,
            delay,
            pending: PendingUpdateSet::new(),
            network_retry: config.network_retry(),
            broker_retry: config.broker_retry(),
            broker_cooldown: false,
            params_unpublished: false,
            address: None,
        }
    }

    /// Announce the loaded record.  Connection work starts with the first
    /// [`step`](Self::step).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        let marker = self.store.marker();
        info!("dispatcher: started with {:?} record", marker);
        sink.emit(&AppEvent::Started(marker));
    }

    // ── Command intake ────────────────────────────────────────

    /// Queue the sections of one `<prefix>/config` payload.
    ///
    /// Returns how many sections were accepted.  Rejected sections are
    /// reported through `sink` and do not block the others.
    pub fn intake(
        &mut self,
        payload: &[u8],
        sink: &mut impl EventSink,
    ) -> crate::error::Result<usize> {
        let parsed = match parse_config(payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("dispatcher: payload dropped: {}", e);
                sink.emit(&AppEvent::Rejected(e.into()));
                return Err(e.into());
            }
        };

        let mut accepted = 0;
        for section in parsed {
            match section {
                Ok(cmd) => {
                    debug!("dispatcher: queued {:?}", cmd);
                    self.pending.insert(PendingUpdate::from(cmd));
                    accepted += 1;
                }
                Err(e) => {
                    warn!("dispatcher: section rejected: {}", e);
                    sink.emit(&AppEvent::Rejected(e.into()));
                }
            }
        }
        Ok(accepted)
    }

    /// Publish an offset-corrected climate reading.
    pub fn report_climate(&mut self, sample: ClimateSample, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Climate(sample));
        self.publish(&StatusReport::Climate(sample));
    }

    // ── Per-iteration dispatch ────────────────────────────────

    /// Supervise the links, then service the highest-priority pending kind.
    pub fn step(&mut self, sink: &mut impl EventSink) -> DispatchState {
        self.supervise_links(sink);

        let Some(update) = self.pending.take_next() else {
            return DispatchState::Idle;
        };

        match update {
            PendingUpdate::Network(creds) => {
                self.service_network(creds, sink);
                DispatchState::NetworkPending
            }
            PendingUpdate::Broker(endpoint) => {
                self.service_broker(endpoint, sink);
                DispatchState::BrokerPending
            }
            PendingUpdate::SensorThresholds(update) => {
                self.service_thresholds(update, sink);
                DispatchState::ThresholdsPending
            }
            PendingUpdate::ZoneCommand(req) => {
                self.service_zone(req, sink);
                DispatchState::ZonePending
            }
            PendingUpdate::ProgramCommand(program) => {
                self.service_program(program, sink);
                DispatchState::ProgramPending
            }
        }
    }

    fn supervise_links(&mut self, sink: &mut impl EventSink) {
        if !self.network.is_connected() {
            if self.address.take().is_some() {
                warn!("dispatcher: network lost");
                sink.emit(&AppEvent::NetworkLost);
            }
            self.pending.insert(PendingUpdate::Network(None));
        } else if !self.broker.is_connected() {
            if self.broker_cooldown {
                self.broker_cooldown = false;
            } else {
                self.pending.insert(PendingUpdate::Broker(None));
            }
        }
    }

    fn service_network(&mut self, creds: Option<Credentials>, sink: &mut impl EventSink) {
        if let Some(c) = creds {
            self.store.stage(FieldGroup::Network(c));
        }

        let Credentials { ssid, passphrase } = self.store.credentials().clone();
        info!("dispatcher: joining '{}'", ssid);
        let network = &mut self.network;
        let result = self
            .network_retry
            .run(&mut self.delay, |_| network.connect(&ssid, &passphrase));

        match result {
            Ok(address) => {
                info!("dispatcher: network up, address {}", address);
                self.address = Some(address);
                sink.emit(&AppEvent::NetworkConnected { ssid, address });
                self.pending.insert(PendingUpdate::Broker(None));
            }
            Err(e) => {
                // Staged credentials stay in place for the next attempt.
                self.pending.insert(PendingUpdate::Network(None));
                sink.emit(&AppEvent::ConnectivityFailed(e));
            }
        }
    }

    fn service_broker(&mut self, endpoint: Option<Endpoint>, sink: &mut impl EventSink) {
        if let Some(e) = endpoint {
            self.store.stage(FieldGroup::Broker(e));
        }

        let Endpoint { address, port } = self.store.broker();
        info!("dispatcher: connecting to broker {}:{}", address, port);
        let broker = &mut self.broker;
        let result = self
            .broker_retry
            .run(&mut self.delay, |_| broker.connect(address, port));

        match result {
            Ok(()) => {
                self.broker_cooldown = false;
                sink.emit(&AppEvent::BrokerConnected { address, port });
                self.commit(sink);
                self.publish_link_status();
            }
            Err(e) => {
                let staged = self.store.credentials().clone();
                self.store.discard();
                if *self.store.credentials() != staged {
                    // The rolled-back network must be rejoined.
                    self.pending.insert(PendingUpdate::Network(None));
                }
                self.broker_cooldown = true;
                warn!("dispatcher: broker unreachable, staged changes rolled back");
                sink.emit(&AppEvent::ConnectivityFailed(e));
                sink.emit(&AppEvent::ConfigRolledBack);
            }
        }
    }

    fn service_thresholds(&mut self, update: ThresholdUpdate, sink: &mut impl EventSink) {
        let thresholds = match update.apply(self.store.thresholds()) {
            Ok(t) => t,
            Err(e) => {
                warn!("dispatcher: thresholds rejected: {}", e);
                sink.emit(&AppEvent::Rejected(e.into()));
                return;
            }
        };

        self.store.stage(FieldGroup::Thresholds(thresholds));
        self.commit(sink);
        sink.emit(&AppEvent::ThresholdsUpdated(thresholds));
        self.params_unpublished = !self.publish(&StatusReport::DhtParams(thresholds));
    }

    fn service_zone(&mut self, req: ZoneRequest, sink: &mut impl EventSink) {
        let frame = match encode_zone(req.zone, req.minutes) {
            Ok(f) => f,
            Err(e) => {
                warn!("dispatcher: zone command rejected: {}", e);
                sink.emit(&AppEvent::Rejected(e.into()));
                return;
            }
        };

        self.actuator.set_pump(req.minutes > 0);
        self.actuator.transmit(&frame);
        info!("dispatcher: zone {} for {} min", req.zone, req.minutes);
        sink.emit(&AppEvent::ZoneStarted {
            zone: req.zone,
            minutes: req.minutes,
        });
    }

    fn service_program(&mut self, program: i32, sink: &mut impl EventSink) {
        let frame = match encode_program(program) {
            Ok(f) => f,
            Err(e) => {
                warn!("dispatcher: program command rejected: {}", e);
                sink.emit(&AppEvent::Rejected(e.into()));
                return;
            }
        };

        self.actuator.transmit(&frame);
        info!("dispatcher: program {} started", program);
        sink.emit(&AppEvent::ProgramStarted(program));
    }

    // ── Helpers ───────────────────────────────────────────────

    fn commit(&mut self, sink: &mut impl EventSink) {
        let was_staged = self.store.marker() != Marker::Committed;
        match self.store.commit() {
            Ok(()) if was_staged => sink.emit(&AppEvent::ConfigCommitted),
            Ok(()) => {}
            Err(e) => sink.emit(&AppEvent::PersistenceFailed(e)),
        }
    }

    fn publish_link_status(&mut self) {
        if let Some(ip) = self.address {
            let ssid = self.store.credentials().ssid.clone();
            self.publish(&StatusReport::Wifi { ssid, ip });
        }
        let Endpoint { address, port } = self.store.broker();
        self.publish(&StatusReport::Broker { ip: address, port });

        if self.params_unpublished {
            let params = StatusReport::DhtParams(self.store.thresholds());
            self.params_unpublished = !self.publish(&params);
        }
    }

    /// Returns whether the report reached the broker.
    fn publish(&mut self, report: &StatusReport) -> bool {
        match self.broker.publish(report) {
            Ok(()) => true,
            Err(e) => {
                debug!("dispatcher: status not published: {}", e);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn pending(&self) -> &PendingUpdateSet {
        &self.pending
    }

    /// Address assigned by the last successful network join.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore<S> {
        &mut self.store
    }
}
