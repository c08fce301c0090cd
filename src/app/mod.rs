//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the bridge's business rules: payload intake, the
//! prioritised pending update set, staged configuration with rollback,
//! and status reporting.  All interaction with WiFi, MQTT, flash and the
//! sprinkler bus happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod pending;
pub mod ports;
pub mod retry;
pub mod status;
