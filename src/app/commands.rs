//! Inbound commands to the application core.
//!
//! The MQTT adapter delivers raw `<prefix>/config` payloads; [`parse_config`]
//! turns one payload into at most four [`AppCommand`]s, one per section.
//! Section-level problems, including values of the wrong JSON type, are
//! reported per section so that a bad `water` block does not cost the
//! caller a good `dht` block in the same message.
//!
//! ```json
//! { "wifi":  { "ssid": "...", "pw": "..." },
//!   "mqtt":  { "ip": "10.0.0.5", "port": 1883 },
//!   "dht":   { "t_offset": -1, "t_hold": 0.5, "h_hold": 3 },
//!   "water": { "zone": 5, "time": 10 } }
//! ```

use core::net::Ipv4Addr;

use heapless::Vec;
use serde_json::{Map, Value};

use crate::app::pending::{ThresholdUpdate, ZoneRequest};
use crate::error::{PayloadError, ValidationError};
use crate::store::record::{Credentials, Endpoint, PASSPHRASE_MAX, SSID_MAX, bounded};

/// Payloads above this size are dropped unparsed.
pub const MAX_PAYLOAD_LEN: usize = 512;

/// Commands that the MQTT intake can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Join a different WiFi network.
    Network(Credentials),
    /// Use a different MQTT broker.
    Broker(Endpoint),
    /// Adjust one or more climate thresholds.
    Thresholds(ThresholdUpdate),
    /// Run a zone for a number of minutes (0 stops it).
    Zone(ZoneRequest),
    /// Start a stored program.
    Program(i32),
}

/// Outcome of one payload: one entry per section present.
pub type ParsedConfig = Vec<Result<AppCommand, ValidationError>, 4>;

// ── Wire shape ────────────────────────────────────────────────

/// Typed view of one section's fields.
///
/// Numbers are accepted as JSON numbers (fractions truncate toward zero)
/// or as numeric strings; anything else is a type error for the section.
struct Section<'a> {
    name: &'static str,
    fields: &'a Map<String, Value>,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, value: &'a Value) -> Result<Self, ValidationError> {
        let fields = value
            .as_object()
            .ok_or(ValidationError::FieldType(name))?;
        Ok(Self { name, fields })
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn text(&self, key: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ValidationError::FieldType(self.name)),
        }
    }

    fn real(&self, key: &str) -> Result<Option<f64>, ValidationError> {
        let parsed = match self.present(key) {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or(ValidationError::FieldType(self.name))
    }

    /// Saturates at the `i32` bounds; range checks happen downstream.
    fn integer(&self, key: &str) -> Result<Option<i32>, ValidationError> {
        if let Some(Value::Number(n)) = self.present(key) {
            if let Some(v) = n.as_i64() {
                return Ok(Some(v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32));
            }
        }
        // `as` saturates float to int conversions.
        Ok(self.real(key)?.map(|v| v.trunc() as i32))
    }
}

// ── Parsing ───────────────────────────────────────────────────

/// Parse one `<prefix>/config` payload.
///
/// Fails as a whole only when the payload is oversized or is not a JSON
/// object.  Unknown keys are ignored.
pub fn parse_config(payload: &[u8]) -> Result<ParsedConfig, PayloadError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(PayloadError::TooLarge);
    }
    // Sections stay untyped here so a bad value only costs its own section.
    let msg: Map<String, Value> =
        serde_json::from_slice(payload).map_err(|_| PayloadError::Malformed)?;
    let section = |key: &str| msg.get(key).filter(|v| !v.is_null());

    let sections = [
        section("wifi").map(wifi_command),
        section("mqtt").map(mqtt_command),
        section("dht").and_then(dht_command),
        section("water").map(water_command),
    ];

    let mut out = ParsedConfig::new();
    for result in sections.into_iter().flatten() {
        let pushed = out.push(result);
        debug_assert!(pushed.is_ok(), "more sections than ParsedConfig holds");
    }
    Ok(out)
}

fn wifi_command(value: &Value) -> Result<AppCommand, ValidationError> {
    let s = Section::new("wifi", value)?;
    let (Some(ssid), Some(pw)) = (s.text("ssid")?, s.text("pw")?) else {
        return Err(ValidationError::Incomplete("wifi"));
    };
    if ssid.is_empty() || ssid.len() > SSID_MAX {
        return Err(ValidationError::SsidLength);
    }
    if pw.len() > PASSPHRASE_MAX {
        return Err(ValidationError::PassphraseLength);
    }
    Ok(AppCommand::Network(Credentials {
        ssid: bounded(ssid),
        passphrase: bounded(pw),
    }))
}

fn mqtt_command(value: &Value) -> Result<AppCommand, ValidationError> {
    let s = Section::new("mqtt", value)?;
    let (Some(ip), Some(port)) = (s.text("ip")?, s.integer("port")?) else {
        return Err(ValidationError::Incomplete("mqtt"));
    };
    let address: Ipv4Addr = ip.parse().map_err(|_| ValidationError::BrokerAddress)?;
    let port = u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or(ValidationError::BrokerPort)?;
    Ok(AppCommand::Broker(Endpoint { address, port }))
}

/// `None` when the section carries none of the known fields.
fn dht_command(value: &Value) -> Option<Result<AppCommand, ValidationError>> {
    let fields = Section::new("dht", value).and_then(|s| {
        Ok(ThresholdUpdate {
            temp_offset: s.integer("t_offset")?,
            temp_level: s.real("t_hold")?.map(|v| v as f32),
            hum_level: s.integer("h_hold")?,
        })
    });
    match fields {
        Ok(update) if update.is_empty() => None,
        Ok(update) => Some(Ok(AppCommand::Thresholds(update))),
        Err(e) => Some(Err(e)),
    }
}

fn water_command(value: &Value) -> Result<AppCommand, ValidationError> {
    let s = Section::new("water", value)?;
    match (s.integer("zone")?, s.integer("time")?, s.integer("program")?) {
        (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(ValidationError::AmbiguousWatering),
        (Some(zone), Some(minutes), None) => Ok(AppCommand::Zone(ZoneRequest { zone, minutes })),
        (None, None, Some(program)) => Ok(AppCommand::Program(program)),
        _ => Err(ValidationError::Incomplete("water")),
    }
}
