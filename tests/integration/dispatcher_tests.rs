//! End-to-end dispatcher behaviour against the mock adapters.

use core::net::Ipv4Addr;

use hunterbridge::app::dispatcher::DispatchState;
use hunterbridge::app::events::AppEvent;
use hunterbridge::app::pending::UpdateKind;
use hunterbridge::app::status::StatusReport;
use hunterbridge::config::BridgeConfig;
use hunterbridge::error::{ConnectivityError, Error, PayloadError, StoreError, ValidationError};
use hunterbridge::protocol::read_bitfield;
use hunterbridge::sensors::climate::ClimateSample;
use hunterbridge::store::record::{Marker, SensorThresholds};

use crate::mock_hw::*;

fn rejected(e: ValidationError) -> AppEvent {
    AppEvent::Rejected(Error::Validation(e))
}

// ── Network and broker updates ────────────────────────────────

#[test]
fn first_boot_connects_and_commits_defaults() {
    let (mut d, mut sink) = bridge();
    assert_eq!(sink.events, vec![AppEvent::Started(Marker::Staged)]);

    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(d.address(), Some(ASSIGNED_IP));
    assert!(d.pending().contains(UpdateKind::Broker));

    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    let cfg = d.store().storage().config().unwrap();
    assert_eq!(cfg.marker, Marker::Committed);
    assert_eq!(cfg.credentials.ssid.as_str(), HOME_SSID);
    assert_eq!(cfg.broker.address, HOME_BROKER);
    assert!(sink.contains(&AppEvent::ConfigCommitted));

    assert_eq!(
        d.broker().published,
        vec![
            StatusReport::Wifi {
                ssid: heapless::String::try_from(HOME_SSID).unwrap(),
                ip: ASSIGNED_IP,
            },
            StatusReport::Broker {
                ip: HOME_BROKER,
                port: 1883,
            },
        ]
    );
}

#[test]
fn wifi_change_commits_after_broker_reconnects() {
    let (mut d, mut sink) = online();

    let accepted = d
        .intake(br#"{"wifi":{"ssid":"Home2","pw":"abc123"}}"#, &mut sink)
        .unwrap();
    assert_eq!(accepted, 1);

    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(d.network().last_ssid(), Some("Home2"));
    assert!(d.pending().contains(UpdateKind::Broker));
    // Joined but not yet durable.
    assert_eq!(d.store().marker(), Marker::Staged);
    assert_eq!(
        d.store().storage().config().unwrap().credentials.ssid.as_str(),
        HOME_SSID
    );

    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    let cfg = d.store().storage().config().unwrap();
    assert_eq!(cfg.marker, Marker::Committed);
    assert_eq!(cfg.credentials.ssid.as_str(), "Home2");
    assert_eq!(cfg.credentials.passphrase.as_str(), "abc123");
    assert!(sink.contains(&AppEvent::ConfigCommitted));
}

#[test]
fn unreachable_broker_rolls_back_endpoint() {
    let (mut d, mut sink) = online();
    let before = d.store().storage().record().unwrap();
    let attempts_before = d.broker().attempts.len();
    let delay_before = d.delay().total_ms();
    d.broker_mut().reachable = false;

    d.intake(br#"{"mqtt":{"ip":"10.0.0.5","port":1883}}"#, &mut sink)
        .unwrap();
    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);

    let target: (Ipv4Addr, u16) = (Ipv4Addr::new(10, 0, 0, 5), 1883);
    let attempts = &d.broker().attempts[attempts_before..];
    assert_eq!(attempts, &[target; 5]);
    // Four back-offs between five attempts.
    assert_eq!(d.delay().total_ms() - delay_before, 20_000);

    assert_eq!(d.store().storage().record().unwrap(), before);
    assert_eq!(d.store().broker().address, HOME_BROKER);
    assert!(sink.contains(&AppEvent::ConnectivityFailed(
        ConnectivityError::BrokerFailed
    )));
    assert!(sink.contains(&AppEvent::ConfigRolledBack));
    assert!(!d.pending().contains(UpdateKind::Network));

    // One quiet step, then the stored endpoint is retried.
    assert_eq!(d.step(&mut sink), DispatchState::Idle);
    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    assert_eq!(d.broker().attempts.last(), Some(&(HOME_BROKER, 1883)));
}

#[test]
fn rollback_of_network_change_rejoins_previous_network() {
    let (mut d, mut sink) = online();
    d.broker_mut().reachable = false;

    d.intake(br#"{"wifi":{"ssid":"Home2","pw":"abc123"}}"#, &mut sink)
        .unwrap();
    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(d.network().last_ssid(), Some("Home2"));

    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    assert!(sink.contains(&AppEvent::ConfigRolledBack));
    assert_eq!(d.store().credentials().ssid.as_str(), HOME_SSID);
    assert!(d.pending().contains(UpdateKind::Network));

    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(d.network().last_ssid(), Some(HOME_SSID));
}

#[test]
fn network_retries_until_joined() {
    let (mut d, mut sink) = bridge();
    d.network_mut().failures_left = 3;

    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(d.network().calls.len(), 4);
    assert_eq!(d.delay().total_ms(), 1_500);
    assert_eq!(d.address(), Some(ASSIGNED_IP));
}

#[test]
fn lost_network_is_rejoined_without_rewriting_record() {
    let (mut d, mut sink) = online();
    assert_eq!(d.store().storage().writes, 1);

    d.network_mut().up = false;
    assert_eq!(d.step(&mut sink), DispatchState::NetworkPending);
    assert_eq!(sink.events[0], AppEvent::NetworkLost);
    assert!(matches!(
        sink.events[1],
        AppEvent::NetworkConnected { address, .. } if address == ASSIGNED_IP
    ));

    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    assert_eq!(d.store().storage().writes, 1);
    assert!(!sink.contains(&AppEvent::ConfigCommitted));
}

// ── Priority ──────────────────────────────────────────────────

#[test]
fn sections_are_serviced_in_priority_order() {
    let (mut d, mut sink) = online();
    let payload = br#"{
        "water": {"program": 2},
        "dht":   {"t_offset": 1},
        "mqtt":  {"ip": "10.0.0.5", "port": 1884},
        "wifi":  {"ssid": "Home2", "pw": "abc123"}
    }"#;
    assert_eq!(d.intake(payload, &mut sink).unwrap(), 4);

    let states: Vec<_> = (0..5).map(|_| d.step(&mut sink)).collect();
    assert_eq!(
        states,
        vec![
            DispatchState::NetworkPending,
            DispatchState::BrokerPending,
            DispatchState::ThresholdsPending,
            DispatchState::ProgramPending,
            DispatchState::Idle,
        ]
    );

    let cfg = d.store().storage().config().unwrap();
    assert_eq!(cfg.credentials.ssid.as_str(), "Home2");
    assert_eq!(cfg.broker.address, Ipv4Addr::new(10, 0, 0, 5));
    assert_eq!(cfg.broker.port, 1884);
    assert_eq!(cfg.thresholds.temp_offset, 1);
    assert_eq!(d.actuator().frames().len(), 1);
}

// ── Thresholds ────────────────────────────────────────────────

#[test]
fn thresholds_commit_while_broker_is_down() {
    let (mut d, mut sink) = online();
    let writes = d.store().storage().writes;
    d.broker_mut().go_down();

    d.intake(br#"{"dht":{"t_hold":0.3}}"#, &mut sink).unwrap();
    let serviced = (0..3).any(|_| d.step(&mut sink) == DispatchState::ThresholdsPending);
    assert!(serviced);

    assert_eq!(d.store().storage().writes, writes + 1);
    let stored = d.store().storage().config().unwrap().thresholds;
    assert_eq!(stored.temp_level, 0.3);
    assert!(sink.contains(&AppEvent::ThresholdsUpdated(stored)));

    assert_eq!(
        d.broker().publish_attempts.last(),
        Some(&StatusReport::DhtParams(stored))
    );
    let params_published = |d: &TestBridge| {
        d.broker()
            .published
            .iter()
            .filter(|r| **r == StatusReport::DhtParams(stored))
            .count()
    };
    assert_eq!(params_published(&d), 0);

    // Broker comes back: the committed parameters go out with the link status.
    d.broker_mut().reachable = true;
    let recovered = (0..3).any(|_| {
        d.step(&mut sink);
        d.broker().up
    });
    assert!(recovered);
    assert_eq!(params_published(&d), 1);
    assert_eq!(
        d.broker().published.last(),
        Some(&StatusReport::DhtParams(stored))
    );
    assert_eq!(d.store().storage().writes, writes + 1);

    // Already delivered; a later reconnect does not repeat it.
    d.broker_mut().go_down();
    d.broker_mut().reachable = true;
    assert_eq!(d.step(&mut sink), DispatchState::BrokerPending);
    assert!(d.broker().up);
    assert_eq!(params_published(&d), 1);
}

#[test]
fn thresholds_published_immediately_when_broker_is_up() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"dht":{"h_hold":5}}"#, &mut sink).unwrap();
    assert_eq!(d.step(&mut sink), DispatchState::ThresholdsPending);

    let stored = d.store().thresholds();
    assert_eq!(
        d.broker().published.last(),
        Some(&StatusReport::DhtParams(stored))
    );

    d.broker_mut().go_down();
    d.broker_mut().reachable = true;
    d.step(&mut sink);
    assert!(
        !matches!(d.broker().published.last(), Some(StatusReport::DhtParams(_))),
        "parameters republished on reconnect"
    );
}

#[test]
fn partial_thresholds_keep_other_fields() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"dht":{"t_offset":-2,"h_hold":4}}"#, &mut sink)
        .unwrap();
    d.step(&mut sink);
    d.intake(br#"{"dht":{"t_hold":1.5}}"#, &mut sink).unwrap();
    d.step(&mut sink);

    assert_eq!(
        d.store().thresholds(),
        SensorThresholds {
            temp_offset: -2,
            temp_level: 1.5,
            hum_level: 4,
        }
    );
}

#[test]
fn out_of_range_threshold_rejects_whole_update() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"dht":{"t_offset":5,"h_hold":2}}"#, &mut sink)
        .unwrap();

    assert_eq!(d.step(&mut sink), DispatchState::ThresholdsPending);
    assert!(sink.contains(&rejected(ValidationError::TempOffset)));
    assert_eq!(d.store().thresholds(), SensorThresholds::default());
    assert_eq!(d.store().storage().writes, 1);
}

// ── Watering ──────────────────────────────────────────────────

#[test]
fn zone_command_transmits_encoded_frame() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"water":{"zone":5,"time":10}}"#, &mut sink)
        .unwrap();

    assert_eq!(d.step(&mut sink), DispatchState::ZonePending);
    let frames = d.actuator().frames();
    assert_eq!(frames.len(), 1);
    let bytes = frames[0].bytes();
    assert_eq!(read_bitfield(bytes, 23, 7), 0x1C);
    assert_eq!(read_bitfield(bytes, 36, 7), 0x1C);
    assert_eq!(read_bitfield(bytes, 31, 4), 10);
    assert_eq!(read_bitfield(bytes, 44, 4), 0);
    assert_eq!(read_bitfield(bytes, 109, 4), 4);
    assert!(sink.contains(&AppEvent::ZoneStarted { zone: 5, minutes: 10 }));
}

#[test]
fn pump_follows_requested_minutes() {
    let (mut d, mut sink) = online();

    d.intake(br#"{"water":{"zone":3,"time":15}}"#, &mut sink)
        .unwrap();
    d.step(&mut sink);
    assert!(d.actuator().pump_on());
    assert_eq!(
        d.actuator().calls.first(),
        Some(&ActuatorCall::SetPump(true))
    );

    d.intake(br#"{"water":{"zone":3,"time":0}}"#, &mut sink)
        .unwrap();
    d.step(&mut sink);
    assert!(!d.actuator().pump_on());
    assert_eq!(d.actuator().frames().len(), 2);
}

#[test]
fn out_of_range_zone_is_rejected_at_dispatch() {
    let (mut d, mut sink) = online();
    assert_eq!(
        d.intake(br#"{"water":{"zone":49,"time":10}}"#, &mut sink)
            .unwrap(),
        1
    );

    assert_eq!(d.step(&mut sink), DispatchState::ZonePending);
    assert!(d.actuator().calls.is_empty());
    assert!(sink.contains(&rejected(ValidationError::Zone(49))));
}

#[test]
fn program_command_transmits_index() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"water":{"program":3}}"#, &mut sink).unwrap();

    assert_eq!(d.step(&mut sink), DispatchState::ProgramPending);
    let frames = d.actuator().frames();
    assert_eq!(read_bitfield(frames[0].bytes(), 31, 2), 2);
    assert!(sink.contains(&AppEvent::ProgramStarted(3)));
}

#[test]
fn watering_commands_never_touch_the_record() {
    let (mut d, mut sink) = online();
    for _ in 0..3 {
        assert_eq!(d.step(&mut sink), DispatchState::Idle);
    }
    d.intake(br#"{"water":{"zone":1,"time":5}}"#, &mut sink)
        .unwrap();
    d.step(&mut sink);
    d.intake(br#"{"water":{"program":1}}"#, &mut sink).unwrap();
    d.step(&mut sink);

    assert_eq!(d.store().storage().writes, 1);
}

// ── Intake ────────────────────────────────────────────────────

#[test]
fn bad_sections_do_not_block_good_ones() {
    let (mut d, mut sink) = online();
    let payload = br#"{
        "wifi":  {"ssid": "only"},
        "water": {"zone": 5, "time": 10, "program": 1},
        "dht":   {"h_hold": 3}
    }"#;

    assert_eq!(d.intake(payload, &mut sink).unwrap(), 1);
    assert!(sink.contains(&rejected(ValidationError::Incomplete("wifi"))));
    assert!(sink.contains(&rejected(ValidationError::AmbiguousWatering)));
    assert!(d.pending().contains(UpdateKind::SensorThresholds));
    assert!(!d.pending().contains(UpdateKind::Network));
    assert!(!d.pending().contains(UpdateKind::ZoneCommand));
}

#[test]
fn mistyped_value_costs_only_its_section() {
    let (mut d, mut sink) = online();

    let accepted = d
        .intake(br#"{"dht":{"h_hold":4},"water":{"zone":5,"time":10.0}}"#, &mut sink)
        .unwrap();
    assert_eq!(accepted, 2);
    assert!(d.pending().contains(UpdateKind::SensorThresholds));
    assert!(d.pending().contains(UpdateKind::ZoneCommand));

    let accepted = d
        .intake(
            br#"{"wifi":{"ssid":"Home2","pw":"abc123"},"mqtt":{"ip":"10.0.0.5","port":"1884"}}"#,
            &mut sink,
        )
        .unwrap();
    assert_eq!(accepted, 2);

    let accepted = d
        .intake(br#"{"mqtt":{"ip":"10.0.0.5","port":[1884]},"water":{"program":2}}"#, &mut sink)
        .unwrap();
    assert_eq!(accepted, 1);
    assert!(sink.contains(&rejected(ValidationError::FieldType("mqtt"))));

    let states: Vec<_> = (0..5).map(|_| d.step(&mut sink)).collect();
    assert_eq!(
        states,
        vec![
            DispatchState::NetworkPending,
            DispatchState::BrokerPending,
            DispatchState::ThresholdsPending,
            DispatchState::ZonePending,
            DispatchState::ProgramPending,
        ]
    );
    let cfg = d.store().storage().config().unwrap();
    assert_eq!(cfg.credentials.ssid.as_str(), "Home2");
    assert_eq!(cfg.broker.port, 1884);
    assert_eq!(cfg.thresholds.hum_level, 4);
    assert!(sink.contains(&AppEvent::ZoneStarted { zone: 5, minutes: 10 }));
    assert!(sink.contains(&AppEvent::ProgramStarted(2)));
}

#[test]
fn oversized_payload_is_dropped() {
    let (mut d, mut sink) = online();
    let payload = vec![b' '; 600];

    assert_eq!(
        d.intake(&payload, &mut sink),
        Err(Error::Payload(PayloadError::TooLarge))
    );
    assert!(d.pending().is_empty());
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn failed_commit_leaves_record_staged_until_next_commit() {
    let mut nvs = MockNvs::new();
    nvs.fail_writes = true;
    let (mut d, mut sink) = bridge_with(nvs, &BridgeConfig::default());

    d.step(&mut sink);
    d.step(&mut sink);
    assert!(d.broker().up);
    assert!(sink.contains(&AppEvent::PersistenceFailed(StoreError::WriteFailed)));
    assert_eq!(d.store().marker(), Marker::Staged);
    assert!(d.store().storage().record().is_none());

    d.store_mut().storage_mut().fail_writes = false;
    d.intake(br#"{"dht":{"t_offset":1}}"#, &mut sink).unwrap();
    d.step(&mut sink);
    assert_eq!(d.store().marker(), Marker::Committed);
    assert!(sink.contains(&AppEvent::ConfigCommitted));
    assert_eq!(d.store().storage().config().unwrap().thresholds.temp_offset, 1);
}

#[test]
fn committed_record_is_loaded_on_restart() {
    let (mut d, mut sink) = online();
    d.intake(br#"{"wifi":{"ssid":"Home2","pw":"abc123"}}"#, &mut sink)
        .unwrap();
    d.step(&mut sink);
    d.step(&mut sink);

    let mut nvs = MockNvs::new();
    core::mem::swap(&mut nvs, d.store_mut().storage_mut());
    let (restarted, sink) = bridge_with(nvs, &BridgeConfig::default());
    assert_eq!(sink.events, vec![AppEvent::Started(Marker::Committed)]);
    assert_eq!(restarted.store().credentials().ssid.as_str(), "Home2");
}

// ── Climate ───────────────────────────────────────────────────

#[test]
fn climate_reports_are_published() {
    let (mut d, mut sink) = online();
    let sample = ClimateSample {
        temperature: 21.5,
        humidity: 48.0,
    };

    d.report_climate(sample, &mut sink);
    assert_eq!(sink.events, vec![AppEvent::Climate(sample)]);
    assert_eq!(
        d.broker().published.last(),
        Some(&StatusReport::Climate(sample))
    );
}
