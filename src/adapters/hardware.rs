//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the X-Core [`BusDriver`] and the optional [`PumpRelay`], exposing
//! them through [`ActuatorPort`].  Also puts the DHT21 driver behind
//! [`ClimateSensor`].  This is the only module that turns frames into pin
//! activity; on host targets the drivers run against mock pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::error;

use crate::app::ports::{ActuatorPort, ClimateSensor};
use crate::drivers::bus::BusDriver;
use crate::drivers::dht::Dht21;
use crate::drivers::pump::PumpRelay;
use crate::error::SensorError;
use crate::protocol::Frame;
use crate::sensors::climate::ClimateSample;

/// Concrete adapter that combines the bus line and pump relay.
pub struct HardwareAdapter<P, D, R> {
    bus: BusDriver<P, D>,
    pump: Option<PumpRelay<R>>,
}

impl<P, D, R> HardwareAdapter<P, D, R>
where
    P: OutputPin,
    D: DelayNs,
    R: OutputPin,
{
    /// `pump` is `None` when no relay is fitted.
    pub fn new(bus: BusDriver<P, D>, pump: Option<PumpRelay<R>>) -> Self {
        Self { bus, pump }
    }

    pub fn pump_on(&self) -> bool {
        self.pump.as_ref().is_some_and(PumpRelay::is_on)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P, D, R> ActuatorPort for HardwareAdapter<P, D, R>
where
    P: OutputPin,
    D: DelayNs,
    R: OutputPin,
{
    fn transmit(&mut self, frame: &Frame) {
        if let Err(e) = self.bus.transmit(frame) {
            error!("hw: bus transmit failed: {:?}", e);
        }
    }

    fn set_pump(&mut self, on: bool) {
        if let Some(relay) = self.pump.as_mut() {
            if let Err(e) = relay.set(on) {
                error!("hw: pump relay write failed: {:?}", e);
            }
        }
    }
}

// ── ClimateSensor implementation ──────────────────────────────

impl<P, D> ClimateSensor for Dht21<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<ClimateSample, SensorError> {
        Dht21::read(self)
    }
}
