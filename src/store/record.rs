//! Durable configuration record.
//!
//! Fixed 85-byte little-endian layout, stored as one NVS blob:
//!
//! | offset | size | field                        |
//! |-------:|-----:|------------------------------|
//! |      0 |    1 | marker (0x00 / 0x55 / 0xAA)  |
//! |      1 |   32 | SSID, NUL-padded             |
//! |     33 |   32 | passphrase, NUL-padded       |
//! |     65 |    4 | broker port (i32)            |
//! |     69 |    4 | broker address (octets)      |
//! |     73 |    4 | temperature hysteresis (f32) |
//! |     77 |    4 | humidity hysteresis (i32)    |
//! |     81 |    4 | temperature offset (i32)     |

use core::net::Ipv4Addr;

use heapless::String;
use serde::Serialize;

pub const RECORD_LEN: usize = 85;
pub const SSID_MAX: usize = 32;
pub const PASSPHRASE_MAX: usize = 32;

const MARKER_STAGED: u8 = 0x55;
const MARKER_COMMITTED: u8 = 0xAA;

const OFF_SSID: usize = 1;
const OFF_PASS: usize = OFF_SSID + SSID_MAX;
const OFF_PORT: usize = OFF_PASS + PASSPHRASE_MAX;
const OFF_ADDR: usize = OFF_PORT + 4;
const OFF_TEMP_LEVEL: usize = OFF_ADDR + 4;
const OFF_HUM_LEVEL: usize = OFF_TEMP_LEVEL + 4;
const OFF_TEMP_OFFSET: usize = OFF_HUM_LEVEL + 4;

/// Validity marker of the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    /// Never written, or unreadable.
    Unset,
    /// Holds values not yet confirmed by a successful connection.
    Staged,
    /// Last write was confirmed.
    Committed,
}

impl Marker {
    pub fn from_byte(b: u8) -> Self {
        match b {
            MARKER_STAGED => Self::Staged,
            MARKER_COMMITTED => Self::Committed,
            _ => Self::Unset,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Unset => 0x00,
            Self::Staged => MARKER_STAGED,
            Self::Committed => MARKER_COMMITTED,
        }
    }
}

/// WiFi credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub ssid: String<SSID_MAX>,
    pub passphrase: String<PASSPHRASE_MAX>,
}

/// MQTT broker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub address: Ipv4Addr,
    pub port: u16,
}

/// Climate sensor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorThresholds {
    /// Added to every temperature reading (°C).
    pub temp_offset: i32,
    /// Minimum temperature change worth reporting (°C).
    pub temp_level: f32,
    /// Minimum humidity change worth reporting (%RH).
    pub hum_level: i32,
}

/// In-memory image of the durable record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedConfig {
    pub marker: Marker,
    pub credentials: Credentials,
    pub broker: Endpoint,
    pub thresholds: SensorThresholds,
}

impl PersistedConfig {
    /// Serialise into the durable layout with the given marker.
    pub fn to_record(&self, marker: Marker) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = marker.as_byte();
        put_str(&mut buf[OFF_SSID..OFF_PASS], &self.credentials.ssid);
        put_str(&mut buf[OFF_PASS..OFF_PORT], &self.credentials.passphrase);
        buf[OFF_PORT..OFF_ADDR].copy_from_slice(&i32::from(self.broker.port).to_le_bytes());
        buf[OFF_ADDR..OFF_TEMP_LEVEL].copy_from_slice(&self.broker.address.octets());
        buf[OFF_TEMP_LEVEL..OFF_HUM_LEVEL]
            .copy_from_slice(&self.thresholds.temp_level.to_le_bytes());
        buf[OFF_HUM_LEVEL..OFF_TEMP_OFFSET]
            .copy_from_slice(&self.thresholds.hum_level.to_le_bytes());
        buf[OFF_TEMP_OFFSET..RECORD_LEN]
            .copy_from_slice(&self.thresholds.temp_offset.to_le_bytes());
        buf
    }

    /// Parse a durable record.  Returns `None` for a short buffer or an
    /// `Unset` marker; the caller substitutes defaults.
    pub fn from_record(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_LEN {
            return None;
        }
        let marker = Marker::from_byte(buf[0]);
        if marker == Marker::Unset {
            return None;
        }

        let port = i32::from_le_bytes(word(buf, OFF_PORT));
        let addr = word(buf, OFF_ADDR);

        Some(Self {
            marker,
            credentials: Credentials {
                ssid: get_str(&buf[OFF_SSID..OFF_PASS]),
                passphrase: get_str(&buf[OFF_PASS..OFF_PORT]),
            },
            broker: Endpoint {
                address: Ipv4Addr::from(addr),
                // Out-of-range ports read back as 0.
                port: u16::try_from(port).unwrap_or(0),
            },
            thresholds: SensorThresholds {
                temp_level: f32::from_le_bytes(word(buf, OFF_TEMP_LEVEL)),
                hum_level: i32::from_le_bytes(word(buf, OFF_HUM_LEVEL)),
                temp_offset: i32::from_le_bytes(word(buf, OFF_TEMP_OFFSET)),
            },
        })
    }
}

fn word(buf: &[u8], off: usize) -> [u8; 4] {
    let mut w = [0u8; 4];
    w.copy_from_slice(&buf[off..off + 4]);
    w
}

fn put_str(dst: &mut [u8], s: &str) {
    let n = s.len().min(dst.len());
    dst[..n].copy_from_slice(&s.as_bytes()[..n]);
}

/// Read a NUL-padded field.  Invalid UTF-8 truncates at the first bad byte.
fn get_str<const N: usize>(src: &[u8]) -> String<N> {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    let bytes = &src[..end];
    let text = match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    bounded(text)
}

/// Truncating conversion into a bounded string.
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
