//! Climate change detection.
//!
//! Applies the persisted temperature offset to raw sensor samples and
//! decides whether a reading moved far enough from the last *reported*
//! one to be worth publishing.  Reads closer together than the sensor's
//! minimum interval are skipped.

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::ClimateSensor;
use crate::store::record::SensorThresholds;

/// DHT21 needs two seconds between conversions.
pub const MIN_READ_INTERVAL_MS: u64 = 2_000;

/// One temperature / humidity reading (°C, %RH).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateSample {
    #[serde(rename = "temp")]
    pub temperature: f32,
    pub humidity: f32,
}

pub struct ClimateMonitor {
    interval_ms: u64,
    last_read_ms: Option<u64>,
    last_reported: Option<ClimateSample>,
}

impl ClimateMonitor {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(MIN_READ_INTERVAL_MS),
            last_read_ms: None,
            last_reported: None,
        }
    }

    /// Whether a new read is allowed at `now_ms`.
    pub fn due(&self, now_ms: u64) -> bool {
        self.last_read_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    /// Feed a raw sample taken at `now_ms`.  Returns the offset-corrected
    /// sample when it should be published.
    pub fn observe(
        &mut self,
        raw: ClimateSample,
        thresholds: &SensorThresholds,
        now_ms: u64,
    ) -> Option<ClimateSample> {
        if !self.due(now_ms) {
            return None;
        }
        self.last_read_ms = Some(now_ms);

        let sample = ClimateSample {
            temperature: raw.temperature + thresholds.temp_offset as f32,
            humidity: raw.humidity,
        };

        let changed = match self.last_reported {
            None => true,
            Some(prev) => {
                (sample.temperature - prev.temperature).abs() >= thresholds.temp_level.abs()
                    || (sample.humidity - prev.humidity).abs() >= thresholds.hum_level.abs() as f32
            }
        };

        if changed {
            self.last_reported = Some(sample);
            Some(sample)
        } else {
            debug!(
                "climate: {:.1}°C {:.1}% within hysteresis",
                sample.temperature, sample.humidity
            );
            None
        }
    }

    /// Read `sensor` if due and run the result through [`observe`](Self::observe).
    /// A failed read still consumes the interval.
    pub fn poll<S: ClimateSensor>(
        &mut self,
        sensor: &mut S,
        thresholds: &SensorThresholds,
        now_ms: u64,
    ) -> Option<ClimateSample> {
        if !self.due(now_ms) {
            return None;
        }
        match sensor.read() {
            Ok(raw) => self.observe(raw, thresholds, now_ms),
            Err(e) => {
                warn!("climate: read failed: {}", e);
                self.last_read_ms = Some(now_ms);
                None
            }
        }
    }

    pub fn last_reported(&self) -> Option<ClimateSample> {
        self.last_reported
    }
}
