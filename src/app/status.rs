//! Outbound status payloads for `<prefix>/value`.
//!
//! One group per publish, never all keys at once:
//!
//! ```json
//! {"wifi":{"ssid":"Home2","ip":"192.168.0.42"}}
//! {"broker":{"port":1883,"ip":"10.0.0.5"}}
//! {"dht":{"temp":21.5,"humidity":48.0}}
//! {"dht":{"temp_offset":-1,"temp_level":0.3,"hum_level":2}}
//! ```

use core::fmt::Write;
use core::net::Ipv4Addr;

use heapless::String;
use serde::Serialize;

use crate::error::PayloadError;
use crate::sensors::climate::ClimateSample;
use crate::store::record::{SSID_MAX, SensorThresholds};

/// Dotted-quad text of an address.
type IpText = String<15>;

/// One status group.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Wifi {
        ssid: String<SSID_MAX>,
        ip: Ipv4Addr,
    },
    Broker {
        ip: Ipv4Addr,
        port: u16,
    },
    Climate(ClimateSample),
    DhtParams(SensorThresholds),
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Wire<'a> {
    Wifi { ssid: &'a str, ip: IpText },
    Broker { port: u16, ip: IpText },
    Dht(DhtWire<'a>),
}

#[derive(Serialize)]
#[serde(untagged)]
enum DhtWire<'a> {
    Reading(&'a ClimateSample),
    Params(&'a SensorThresholds),
}

fn ip_text(ip: Ipv4Addr) -> IpText {
    let mut s = IpText::new();
    let written = write!(s, "{ip}");
    debug_assert!(written.is_ok(), "dotted quad longer than IpText");
    s
}

impl StatusReport {
    /// Render the JSON body for the value topic.
    pub fn to_json(&self) -> Result<std::string::String, PayloadError> {
        let wire = match self {
            Self::Wifi { ssid, ip } => Wire::Wifi {
                ssid,
                ip: ip_text(*ip),
            },
            Self::Broker { ip, port } => Wire::Broker {
                port: *port,
                ip: ip_text(*ip),
            },
            Self::Climate(sample) => Wire::Dht(DhtWire::Reading(sample)),
            Self::DhtParams(t) => Wire::Dht(DhtWire::Params(t)),
        };
        serde_json::to_string(&wire).map_err(|_| PayloadError::Malformed)
    }
}
