//! Pending update set.
//!
//! One fixed slot per [`UpdateKind`]; a slot holds the values the dispatcher
//! will stage when it services that kind.  Slots are ordered by priority:
//! a network change invalidates any broker session, and both come before
//! local work.

use crate::error::ValidationError;
use crate::store::record::{Credentials, Endpoint, SensorThresholds};

pub const TEMP_OFFSET_LIMIT: i32 = 3;
pub const TEMP_LEVEL_LIMIT: f32 = 3.0;
pub const HUM_LEVEL_LIMIT: i32 = 10;

/// Update kinds in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateKind {
    Network,
    Broker,
    SensorThresholds,
    ZoneCommand,
    ProgramCommand,
}

impl UpdateKind {
    pub const ALL: [Self; 5] = [
        Self::Network,
        Self::Broker,
        Self::SensorThresholds,
        Self::ZoneCommand,
        Self::ProgramCommand,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Zone run requested over MQTT; range-checked only when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRequest {
    pub zone: i32,
    pub minutes: i32,
}

/// Partial threshold change.  Absent fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThresholdUpdate {
    pub temp_offset: Option<i32>,
    pub temp_level: Option<f32>,
    pub hum_level: Option<i32>,
}

impl ThresholdUpdate {
    pub fn is_empty(&self) -> bool {
        self.temp_offset.is_none() && self.temp_level.is_none() && self.hum_level.is_none()
    }

    /// Fold a newer update into this one, field by field.
    pub fn merge(&mut self, newer: Self) {
        self.temp_offset = newer.temp_offset.or(self.temp_offset);
        self.temp_level = newer.temp_level.or(self.temp_level);
        self.hum_level = newer.hum_level.or(self.hum_level);
    }

    /// Apply on top of `base`.  Any out-of-range field rejects the whole
    /// update.
    pub fn apply(&self, base: SensorThresholds) -> Result<SensorThresholds, ValidationError> {
        let merged = SensorThresholds {
            temp_offset: self.temp_offset.unwrap_or(base.temp_offset),
            temp_level: self.temp_level.unwrap_or(base.temp_level),
            hum_level: self.hum_level.unwrap_or(base.hum_level),
        };

        if !(-TEMP_OFFSET_LIMIT..=TEMP_OFFSET_LIMIT).contains(&merged.temp_offset) {
            return Err(ValidationError::TempOffset);
        }
        if !merged.temp_level.is_finite() || merged.temp_level.abs() > TEMP_LEVEL_LIMIT {
            return Err(ValidationError::TempHysteresis);
        }
        if !(-HUM_LEVEL_LIMIT..=HUM_LEVEL_LIMIT).contains(&merged.hum_level) {
            return Err(ValidationError::HumHysteresis);
        }
        Ok(merged)
    }
}

/// One queued update with the values it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingUpdate {
    /// `None` reconnects with the stored credentials.
    Network(Option<Credentials>),
    /// `None` reconnects with the stored endpoint.
    Broker(Option<Endpoint>),
    SensorThresholds(ThresholdUpdate),
    ZoneCommand(ZoneRequest),
    ProgramCommand(i32),
}

impl PendingUpdate {
    pub fn kind(&self) -> UpdateKind {
        match self {
            Self::Network(_) => UpdateKind::Network,
            Self::Broker(_) => UpdateKind::Broker,
            Self::SensorThresholds(_) => UpdateKind::SensorThresholds,
            Self::ZoneCommand(_) => UpdateKind::ZoneCommand,
            Self::ProgramCommand(_) => UpdateKind::ProgramCommand,
        }
    }
}

impl From<crate::app::commands::AppCommand> for PendingUpdate {
    fn from(cmd: crate::app::commands::AppCommand) -> Self {
        use crate::app::commands::AppCommand;
        match cmd {
            AppCommand::Network(c) => Self::Network(Some(c)),
            AppCommand::Broker(e) => Self::Broker(Some(e)),
            AppCommand::Thresholds(t) => Self::SensorThresholds(t),
            AppCommand::Zone(z) => Self::ZoneCommand(z),
            AppCommand::Program(p) => Self::ProgramCommand(p),
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingUpdateSet {
    slots: [Option<PendingUpdate>; 5],
}

impl PendingUpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `update`, replacing any earlier update of the same kind.
    ///
    /// A bare reconnect never erases values carried by an earlier command,
    /// and threshold updates merge field by field.
    pub fn insert(&mut self, update: PendingUpdate) {
        let idx = update.kind().slot();
        match (&mut self.slots[idx], update) {
            (Some(PendingUpdate::Network(Some(_))), PendingUpdate::Network(None))
            | (Some(PendingUpdate::Broker(Some(_))), PendingUpdate::Broker(None)) => {}
            (Some(PendingUpdate::SensorThresholds(old)), PendingUpdate::SensorThresholds(new)) => {
                old.merge(new);
            }
            (slot, update) => *slot = Some(update),
        }
    }

    pub fn contains(&self, kind: UpdateKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn get(&self, kind: UpdateKind) -> Option<&PendingUpdate> {
        self.slots[kind.slot()].as_ref()
    }

    /// Highest-priority kind currently queued.
    pub fn next_kind(&self) -> Option<UpdateKind> {
        UpdateKind::ALL.into_iter().find(|k| self.contains(*k))
    }

    /// Remove and return the highest-priority update.
    pub fn take_next(&mut self) -> Option<PendingUpdate> {
        let kind = self.next_kind()?;
        self.slots[kind.slot()].take()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
