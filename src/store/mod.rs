//! Persisted configuration with staged writes.
//!
//! [`ConfigStore`] keeps two images of the record:
//!
//! - the **working** copy, which `stage` edits in memory, and
//! - the **durable snapshot**, i.e. what flash holds after the last
//!   successful load or commit.
//!
//! `commit` writes the working copy with the `Committed` marker and
//! refreshes the snapshot; `discard` throws the working copy away.
//! Nothing but `commit` touches flash.

pub mod record;

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::config::LinkDefaults;
use crate::error::StoreError;
use record::{
    Credentials, Endpoint, Marker, PersistedConfig, RECORD_LEN, SensorThresholds, bounded,
};

/// NVS namespace holding the record.
pub const NAMESPACE: &str = "hunter";
/// NVS key of the record blob.
pub const KEY: &str = "cfg";

/// A group of fields that changes together.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldGroup {
    Network(Credentials),
    Broker(Endpoint),
    Thresholds(SensorThresholds),
}

pub struct ConfigStore<S> {
    storage: S,
    defaults: LinkDefaults,
    working: PersistedConfig,
    durable: PersistedConfig,
}

impl<S: StoragePort> ConfigStore<S> {
    /// Wrap `storage` and load the record from it.
    pub fn open(storage: S, defaults: LinkDefaults) -> Self {
        let fallback = Self::defaulted(&defaults);
        let mut store = Self {
            storage,
            defaults,
            working: fallback.clone(),
            durable: fallback,
        };
        store.load();
        store
    }

    /// Re-read the durable record, replacing any staged edits.
    ///
    /// An unset, short or unreadable record yields the build-time network
    /// defaults with zeroed thresholds, marked `Staged` so that the first
    /// successful broker connection persists them.
    pub fn load(&mut self) -> &PersistedConfig {
        let mut buf = [0u8; RECORD_LEN];
        let loaded = match self.storage.read(NAMESPACE, KEY, &mut buf) {
            Ok(n) => PersistedConfig::from_record(&buf[..n]),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("store: read failed ({}), using defaults", e);
                None
            }
        };

        let cfg = match loaded {
            Some(cfg) => {
                info!(
                    "store: loaded {:?} record (ssid '{}', broker {}:{})",
                    cfg.marker, cfg.credentials.ssid, cfg.broker.address, cfg.broker.port
                );
                cfg
            }
            None => {
                info!("store: no valid record, using build-time defaults");
                Self::defaulted(&self.defaults)
            }
        };

        self.durable = cfg.clone();
        self.working = cfg;
        &self.working
    }

    fn defaulted(defaults: &LinkDefaults) -> PersistedConfig {
        PersistedConfig {
            marker: Marker::Staged,
            credentials: Credentials {
                ssid: bounded(defaults.ssid),
                passphrase: bounded(defaults.passphrase),
            },
            broker: Endpoint {
                address: defaults.broker_ip,
                port: defaults.broker_port,
            },
            thresholds: SensorThresholds::default(),
        }
    }

    /// Overwrite one field group in the working copy.  No flash I/O.
    pub fn stage(&mut self, group: FieldGroup) {
        match group {
            FieldGroup::Network(c) => self.working.credentials = c,
            FieldGroup::Broker(e) => self.working.broker = e,
            FieldGroup::Thresholds(t) => self.working.thresholds = t,
        }
        self.working.marker = Marker::Staged;
    }

    /// Persist the working copy.  A no-op when nothing is staged.
    ///
    /// On failure the working copy keeps its `Staged` marker so a later
    /// commit can retry.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        if self.working.marker == Marker::Committed {
            return Ok(());
        }

        let rec = self.working.to_record(Marker::Committed);
        if let Err(e) = self.storage.write(NAMESPACE, KEY, &rec) {
            warn!("store: commit failed: {}", e);
            return Err(StoreError::WriteFailed);
        }

        self.working.marker = Marker::Committed;
        self.durable = self.working.clone();
        info!("store: record committed");
        Ok(())
    }

    /// Drop staged edits and return to the durable snapshot.
    pub fn discard(&mut self) {
        if self.working != self.durable {
            info!("store: staged changes discarded");
        }
        self.working = self.durable.clone();
    }

    pub fn config(&self) -> &PersistedConfig {
        &self.working
    }

    pub fn marker(&self) -> Marker {
        self.working.marker
    }

    pub fn credentials(&self) -> &Credentials {
        &self.working.credentials
    }

    pub fn broker(&self) -> Endpoint {
        self.working.broker
    }

    pub fn thresholds(&self) -> SensorThresholds {
        self.working.thresholds
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
