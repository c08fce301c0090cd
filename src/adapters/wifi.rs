//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for the network link.
//! One `connect` call is one join attempt; the dispatcher's retry policy
//! decides how often to call it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: simulation for host-side runs.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::NetworkPort;
use crate::error::ConnectivityError;
use crate::store::record::{PASSPHRASE_MAX, SSID_MAX};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate(ssid: &str, passphrase: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > SSID_MAX || passphrase.len() > PASSPHRASE_MAX {
        return Err(ConnectivityError::InvalidCredentials);
    }
    Ok(())
}

fn auth_method_name(passphrase: &str) -> &'static str {
    if passphrase.is_empty() { "open" } else { "WPA/WPA2" }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

/// Host-side stand-in for the radio.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    joins: u32,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Wrap a started-but-unconfigured station driver.
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi }
    }

    fn join(&mut self, ssid: &str, passphrase: &str) -> Result<Ipv4Addr, ConnectivityError> {
        let auth_method = if passphrase.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| ConnectivityError::InvalidCredentials)?,
            password: passphrase
                .try_into()
                .map_err(|_| ConnectivityError::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        });

        if self.wifi.is_connected().unwrap_or(false) {
            let _ = self.wifi.disconnect();
        }
        let mut attempt = || -> Result<Ipv4Addr, esp_idf_svc::sys::EspError> {
            self.wifi.set_configuration(&config)?;
            if !self.wifi.is_started()? {
                self.wifi.start()?;
            }
            self.wifi.connect()?;
            self.wifi.wait_netif_up()?;
            Ok(self.wifi.wifi().sta_netif().get_ip_info()?.ip)
        };
        attempt().map_err(|e| {
            warn!("wifi: join '{}' failed: {}", ssid, e);
            let _ = self.wifi.disconnect();
            ConnectivityError::NetworkFailed
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            sim: SimLink::default(),
        }
    }

    fn join(&mut self, ssid: &str, _passphrase: &str) -> Result<Ipv4Addr, ConnectivityError> {
        self.sim.joins = self.sim.joins.wrapping_add(1);
        self.sim.up = true;
        info!("wifi(sim): associated with '{}' (join {})", ssid, self.sim.joins);
        Ok(Ipv4Addr::new(192, 168, 4, 2))
    }

    /// Simulate the access point going away.
    pub fn drop_link(&mut self) {
        warn!("wifi(sim): link dropped");
        self.sim.up = false;
    }

    pub fn joins(&self) -> u32 {
        self.sim.joins
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<Ipv4Addr, ConnectivityError> {
        validate(ssid, passphrase)?;
        info!(
            "wifi: joining '{}' ({})",
            ssid,
            auth_method_name(passphrase)
        );
        let ip = self.join(ssid, passphrase)?;
        info!("wifi: connected, ip {}", ip);
        Ok(ip)
    }

    #[cfg(target_os = "espidf")]
    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_connected(&self) -> bool {
        self.sim.up
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
