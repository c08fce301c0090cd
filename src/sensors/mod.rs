//! Sensor subsystem — turns raw climate readings into reportable samples.

pub mod climate;
