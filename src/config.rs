//! Firmware configuration.
//!
//! Two layers:
//! - **Build-time fallbacks** (`option_env!`) used when the durable record
//!   has never been written: WiFi credentials, broker endpoint, topic prefix.
//! - [`BridgeConfig`] — loop timing, retry policy parameters and optional
//!   hardware, fixed at build time and not remotely editable.

use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::app::retry::RetryPolicy;

const fn env_or(value: Option<&'static str>, fallback: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => fallback,
    }
}

/// SSID used until a `wifi` command has been committed.
pub const DEFAULT_WIFI_SSID: &str = env_or(option_env!("HUNTER_WIFI_SSID"), "WLAN_SSID");
/// Passphrase used until a `wifi` command has been committed.
pub const DEFAULT_WIFI_PASSWORD: &str =
    env_or(option_env!("HUNTER_WIFI_PASSWORD"), "WLAN_PASSWORD");
/// Broker address (dotted quad) used until an `mqtt` command has been committed.
pub const DEFAULT_BROKER_IP: &str = env_or(option_env!("HUNTER_BROKER_IP"), "192.168.0.10");
/// Broker port used until an `mqtt` command has been committed.
pub const DEFAULT_BROKER_PORT: &str = env_or(option_env!("HUNTER_BROKER_PORT"), "1883");
/// Prefix of the `<prefix>/config` and `<prefix>/value` topics.
pub const TOPIC_PREFIX: &str = env_or(option_env!("HUNTER_TOPIC_PREFIX"), "hunter");

/// Network and broker values the store falls back to for an unset record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefaults {
    pub ssid: &'static str,
    pub passphrase: &'static str,
    pub broker_ip: Ipv4Addr,
    pub broker_port: u16,
}

impl LinkDefaults {
    /// Parse the build-time fallbacks.  A malformed `HUNTER_BROKER_IP` or
    /// `HUNTER_BROKER_PORT` degrades to `0.0.0.0:1883` with a warning.
    pub fn from_build_env() -> Self {
        let broker_ip = DEFAULT_BROKER_IP.parse().unwrap_or_else(|_| {
            log::warn!("config: invalid build-time broker IP '{}'", DEFAULT_BROKER_IP);
            Ipv4Addr::UNSPECIFIED
        });
        let broker_port = DEFAULT_BROKER_PORT.parse().unwrap_or_else(|_| {
            log::warn!("config: invalid build-time broker port '{}'", DEFAULT_BROKER_PORT);
            1883
        });
        Self {
            ssid: DEFAULT_WIFI_SSID,
            passphrase: DEFAULT_WIFI_PASSWORD,
            broker_ip,
            broker_port,
        }
    }
}

/// Core runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Loop ---
    /// Control loop period (milliseconds)
    pub loop_interval_ms: u32,

    // --- Connectivity ---
    /// Delay between WiFi connect attempts (the network retries forever)
    pub network_backoff_ms: u32,
    /// Broker connect attempts per dispatch step
    pub broker_attempts: u32,
    /// Delay between broker connect attempts
    pub broker_backoff_ms: u32,

    // --- Climate sensor ---
    /// Minimum spacing between two DHT21 reads
    pub climate_interval_ms: u32,

    // --- Hardware ---
    /// Drive the auxiliary pump relay during zone runs
    pub use_pump: bool,
}

impl BridgeConfig {
    /// Retry policy for WiFi: never gives up.
    pub fn network_retry(&self) -> RetryPolicy {
        RetryPolicy::unbounded(self.network_backoff_ms)
    }

    /// Retry policy for the MQTT broker: a few attempts, then roll back.
    pub fn broker_retry(&self) -> RetryPolicy {
        RetryPolicy::bounded(self.broker_attempts, self.broker_backoff_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 100,

            network_backoff_ms: 500,
            broker_attempts: 5,
            broker_backoff_ms: 5_000,

            climate_interval_ms: 2_000,

            use_pump: false,
        }
    }
}
