//! Unified error types for the HunterBridge firmware.
//!
//! One `Copy` enum per failure class.  Everything the dispatcher reports
//! converts into the top-level [`Error`]; [`SensorError`] stays with the
//! climate path, which only logs it.  No variant owns heap data, so errors can be carried inside
//! [`AppEvent`](crate::app::events::AppEvent)s and logged without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A remote-supplied value is outside its allowed range.
    Validation(ValidationError),
    /// A network or broker connection attempt failed.
    Connectivity(ConnectivityError),
    /// The durable configuration record could not be read or written.
    Persistence(StoreError),
    /// An inbound payload could not be parsed at all.
    Payload(PayloadError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// A command or parameter was rejected before any side effect happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Zone outside 1..=48.
    Zone(i32),
    /// Watering time outside 0..=240 minutes.
    Minutes(i32),
    /// Program outside 1..=4.
    Program(i32),
    /// Zone/time and program sent in the same `water` section.
    AmbiguousWatering,
    /// A section is missing one of its required fields.
    Incomplete(&'static str),
    /// A section, or one of its fields, has a JSON type that cannot be
    /// read as the expected value.
    FieldType(&'static str),
    /// SSID empty or longer than 32 bytes.
    SsidLength,
    /// Passphrase longer than 32 bytes.
    PassphraseLength,
    /// Broker address is not a dotted quad.
    BrokerAddress,
    /// Broker port outside 1..=65535.
    BrokerPort,
    /// Temperature offset outside -3..=3.
    TempOffset,
    /// Temperature hysteresis outside -3.0..=3.0 (or not finite).
    TempHysteresis,
    /// Humidity hysteresis outside -10..=10.
    HumHysteresis,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zone(z) => write!(f, "zone {z} outside 1..=48"),
            Self::Minutes(m) => write!(f, "time {m} min outside 0..=240"),
            Self::Program(p) => write!(f, "program {p} outside 1..=4"),
            Self::AmbiguousWatering => write!(f, "zone/time and program sent together"),
            Self::Incomplete(section) => write!(f, "'{section}' section incomplete"),
            Self::FieldType(section) => write!(f, "'{section}' section has a value of the wrong type"),
            Self::SsidLength => write!(f, "SSID must be 1-32 bytes"),
            Self::PassphraseLength => write!(f, "passphrase must be at most 32 bytes"),
            Self::BrokerAddress => write!(f, "broker address is not a dotted quad"),
            Self::BrokerPort => write!(f, "broker port outside 1..=65535"),
            Self::TempOffset => write!(f, "temperature offset outside -3..=3"),
            Self::TempHysteresis => write!(f, "temperature level outside -3.0..=3.0"),
            Self::HumHysteresis => write!(f, "humidity level outside -10..=10"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The access point rejected us or never answered.
    NetworkFailed,
    /// The MQTT broker could not be reached.
    BrokerFailed,
    /// The operation needs a live broker session.
    NotConnected,
    /// The driver refused the credentials before trying.
    InvalidCredentials,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFailed => write!(f, "WiFi connect failed"),
            Self::BrokerFailed => write!(f, "MQTT connect failed"),
            Self::NotConnected => write!(f, "MQTT not connected"),
            Self::InvalidCredentials => write!(f, "credentials rejected by driver"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The durable write did not complete.
    WriteFailed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "record write failed"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Not valid JSON, or not a JSON object.
    Malformed,
    /// Larger than the inbox slot.
    TooLarge,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed JSON"),
            Self::TooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// A failed climate read.  Logged by the monitor and otherwise dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer the start signal in time.
    NoResponse,
    /// A bit was not framed within its time window.
    Timeout,
    /// Checksum byte does not match the payload.
    Checksum,
    /// Pin access failed.
    Gpio,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response"),
            Self::Timeout => write!(f, "bit timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Gpio => write!(f, "GPIO access failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
